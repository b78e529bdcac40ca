//! 命令类型定义模块
//!
//! 两类命令的投递语义刻意不同：
//! - [`RowUpdate`] 是**可合并**的：同一行只有最新的一条有意义，
//!   排队期间被新请求覆盖是正常行为（Overwrite 策略）。
//! - [`LightCommand`] 是**可靠**的：严格 FIFO，一条都不能丢。

/// 背光命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    /// 打开背光
    TurnOn,
    /// 关闭背光
    TurnOff,
}

/// 行更新请求
///
/// 由 `Screen::update` 创建（已通过边界校验），被对应行的
/// worker 消费后即丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    /// 起始列
    pub column: usize,
    /// 目标行
    pub row: usize,
    /// 要写入的文本
    pub text: String,
}

impl RowUpdate {
    pub fn new(column: usize, row: usize, text: impl Into<String>) -> Self {
        Self {
            column,
            row,
            text: text.into(),
        }
    }
}
