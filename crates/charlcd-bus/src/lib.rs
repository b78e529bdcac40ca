//! # charlcd 总线适配层
//!
//! 字符 LCD 硬件抽象层，提供统一的显示设备接口抽象。
//!
//! 上层（`charlcd-driver`）只依赖 [`LcdAdapter`] trait，后端实现按平台选择：
//! - Linux：[`I2cLcdAdapter`]（HD44780 + PCF8574 I2C 背包板）
//! - 测试：`MockLcdAdapter`（`mock` feature，无硬件）

use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod i2c;

#[cfg(target_os = "linux")]
pub use i2c::I2cLcdAdapter;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{BusOp, MockHandle, MockLcdAdapter};

/// 总线适配层统一错误类型
#[derive(Error, Debug)]
pub enum BusError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] BusDeviceError),
    #[error("Device not initialized")]
    NotInitialized,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDeviceErrorKind {
    Unknown,
    NotFound,
    NoDevice,
    AccessDenied,
    Busy,
    InvalidAddress,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct BusDeviceError {
    pub kind: BusDeviceErrorKind,
    pub message: String,
}

impl BusDeviceError {
    pub fn new(kind: BusDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            BusDeviceErrorKind::NoDevice
                | BusDeviceErrorKind::AccessDenied
                | BusDeviceErrorKind::NotFound
        )
    }
}

impl From<String> for BusDeviceError {
    fn from(message: String) -> Self {
        Self::new(BusDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for BusDeviceError {
    fn from(message: &str) -> Self {
        Self::new(BusDeviceErrorKind::Unknown, message)
    }
}

/// 显示设备适配器接口
///
/// 所有方法都是同步阻塞调用；调用方（`DeviceGateway`）负责串行化，
/// 实现方不需要自己加锁。
pub trait LcdAdapter {
    /// 初始化显示控制器。必须在任何其他操作之前调用，且只调用一次。
    fn init(&mut self) -> Result<(), BusError>;

    /// 在 `(column, row)` 处原样写入 `text`（不清行，不换行）。
    fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), BusError>;

    /// 打开背光
    fn backlight_on(&mut self) -> Result<(), BusError>;

    /// 关闭背光
    fn backlight_off(&mut self) -> Result<(), BusError>;
}
