//! Builder 模式实现
//!
//! 提供链式构造 [`Screen`] 实例的便捷方式。

use crate::config::ScreenConfig;
use crate::error::DriverError;
use crate::screen::Screen;
use charlcd_bus::LcdAdapter;

/// Screen Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use charlcd_driver::ScreenBuilder;
///
/// // 默认配置：16x2，/dev/i2c-1，地址 0x27
/// let screen = ScreenBuilder::new().build().unwrap();
///
/// // 20x4 面板，另一条总线
/// let screen = ScreenBuilder::new()
///     .dimensions(20, 4)
///     .i2c_bus(0)
///     .i2c_addr(0x3F)
///     .build()
///     .unwrap();
/// ```
pub struct ScreenBuilder {
    config: ScreenConfig,
    adapter: Option<Box<dyn LcdAdapter + Send>>,
}

impl ScreenBuilder {
    pub fn new() -> Self {
        Self {
            config: ScreenConfig::default(),
            adapter: None,
        }
    }

    /// 整体替换配置（可选，默认 [`ScreenConfig::default`]）
    pub fn config(mut self, config: ScreenConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置屏幕尺寸（列 x 行）
    pub fn dimensions(mut self, columns: usize, rows: usize) -> Self {
        self.config.columns = columns;
        self.config.rows = rows;
        self
    }

    /// 设置 I2C 总线号（`/dev/i2c-{N}`，默认 1）
    pub fn i2c_bus(mut self, bus: u8) -> Self {
        self.config.i2c_bus = bus;
        self
    }

    /// 设置设备地址（默认 0x27）
    pub fn i2c_addr(mut self, addr: u8) -> Self {
        self.config.i2c_addr = addr;
        self
    }

    /// 使用自定义适配器（绕过默认后端；测试用 mock 走这里）
    pub fn with_adapter(mut self, adapter: impl LcdAdapter + Send + 'static) -> Self {
        self.adapter = Some(Box::new(adapter));
        self
    }

    /// 构建 `Screen` 实例：初始化设备并启动全部 worker 线程
    ///
    /// # Errors
    /// - `DriverError::InvalidConfig`: 尺寸越界
    /// - `DriverError::Bus`: 设备打开/初始化失败
    /// - `DriverError::Unsupported`: 当前平台没有默认后端且未提供
    ///   自定义适配器
    pub fn build(self) -> Result<Screen, DriverError> {
        let adapter = match self.adapter {
            Some(adapter) => adapter,
            None => default_adapter(&self.config)?,
        };
        Screen::new(adapter, &self.config)
    }
}

impl Default for ScreenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
fn default_adapter(config: &ScreenConfig) -> Result<Box<dyn LcdAdapter + Send>, DriverError> {
    let adapter = charlcd_bus::I2cLcdAdapter::open(config.i2c_bus, config.i2c_addr)?;
    Ok(Box::new(adapter))
}

#[cfg(not(target_os = "linux"))]
fn default_adapter(_config: &ScreenConfig) -> Result<Box<dyn LcdAdapter + Send>, DriverError> {
    Err(DriverError::Unsupported(
        "the I2C backend is only available on Linux; provide an adapter via with_adapter()"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use charlcd_bus::MockLcdAdapter;

    #[test]
    fn test_builder_defaults() {
        let builder = ScreenBuilder::new();
        assert_eq!(builder.config, ScreenConfig::default());
        assert!(builder.adapter.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let builder = ScreenBuilder::new().dimensions(20, 4).i2c_bus(0).i2c_addr(0x3F);
        assert_eq!(builder.config.columns, 20);
        assert_eq!(builder.config.rows, 4);
        assert_eq!(builder.config.i2c_bus, 0);
        assert_eq!(builder.config.i2c_addr, 0x3F);
    }

    /// 最后一次设置生效
    #[test]
    fn test_builder_dimensions_chaining() {
        let builder = ScreenBuilder::new().dimensions(20, 4).dimensions(16, 2);
        assert_eq!(builder.config.columns, 16);
        assert_eq!(builder.config.rows, 2);
    }

    #[test]
    fn test_builder_with_mock_adapter() {
        let screen = ScreenBuilder::new()
            .with_adapter(MockLcdAdapter::new())
            .build()
            .unwrap();
        assert_eq!(screen.columns(), 16);
        assert_eq!(screen.rows(), 2);
    }

    #[test]
    fn test_builder_rejects_invalid_dimensions() {
        let result = ScreenBuilder::new()
            .dimensions(16, 0)
            .with_adapter(MockLcdAdapter::new())
            .build();
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
    }
}
