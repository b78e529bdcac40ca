//! 屏幕与设备配置
//!
//! 加载一次，之后不可变（所有 worker 启动前就已经确定）。

use serde::{Deserialize, Serialize};

/// 屏幕配置
///
/// # Example
///
/// ```
/// use charlcd_driver::ScreenConfig;
///
/// // 默认：16x2，/dev/i2c-1，地址 0x27
/// let config = ScreenConfig::default();
/// assert_eq!(config.columns, 16);
/// assert_eq!(config.rows, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// 每行字符数
    pub columns: usize,
    /// 行数
    pub rows: usize,
    /// I2C 总线号（`/dev/i2c-{N}`）
    pub i2c_bus: u8,
    /// 设备地址（PCF8574 背包板通常是 0x27 或 0x3F）
    pub i2c_addr: u8,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 2,
            i2c_bus: 1,
            i2c_addr: 0x27,
        }
    }
}
