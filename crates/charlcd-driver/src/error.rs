//! 驱动层错误类型定义

use charlcd_bus::BusError;
use thiserror::Error;

/// 参数校验错误
///
/// 这是唯一会同步返回给调用方的错误：在任何排队发生之前，
/// `Screen::update` 就地检查边界并拒绝越界请求。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 行号越界
    #[error("row ({row}) out of range (0-{max})")]
    RowOutOfRange { row: usize, max: usize },

    /// 列号 + 文本长度越界
    #[error("column + text length ({end}) out of range (0-{columns})")]
    SpanOutOfRange { end: usize, columns: usize },
}

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 总线/设备错误
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// 参数校验错误
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 锁被毒化（worker 线程 panic）
    #[error("poisoned device lock (worker thread panic)")]
    PoisonedLock,

    /// worker 线程创建失败
    #[error("worker thread error: {0}")]
    Thread(String),

    /// 无效配置
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// 当前平台不支持默认后端
    #[error("unsupported platform: {0}")]
    Unsupported(String),
}
