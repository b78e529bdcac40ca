//! 设备网关：物理设备访问的串行化边界
//!
//! 独占持有设备句柄，整个操作体都在同一把互斥锁内执行，
//! 因此来自各行 worker 和背光 worker 的调用在时间上严格互斥，
//! 设备侧观察不到任何交叠或撕裂的写入。

use crate::error::DriverError;
use charlcd_bus::{BusError, LcdAdapter};
use std::sync::Mutex;
use tracing::debug;

/// 设备网关
///
/// 构造时执行且只执行一次 `init`，成功后才可能有任何其他设备调用
/// （worker 都在 `Screen` 里、网关构造之后才启动）。
pub struct DeviceGateway {
    bus: Mutex<Box<dyn LcdAdapter + Send>>,
    /// 整行清空用的空格串（宽度 = 配置列数），预先生成
    blank_row: String,
}

impl DeviceGateway {
    pub fn new(mut adapter: Box<dyn LcdAdapter + Send>, columns: usize) -> Result<Self, BusError> {
        adapter.init()?;
        Ok(Self {
            bus: Mutex::new(adapter),
            blank_row: " ".repeat(columns),
        })
    }

    /// 整行覆写：先把整行清成空格，再在 `column` 处写入 `text`。
    ///
    /// 两次底层写入在同一个临界区内完成，中间不会插入其他操作。
    pub fn write_row(&self, column: usize, row: usize, text: &str) -> Result<(), DriverError> {
        let mut bus = self.bus.lock().map_err(|_| DriverError::PoisonedLock)?;
        debug!("updating screen [{}, {}]: {}", column, row, text);
        bus.write(0, row as u8, &self.blank_row)?;
        bus.write(column as u8, row as u8, text)?;
        Ok(())
    }

    /// 打开背光
    pub fn open_light(&self) -> Result<(), DriverError> {
        let mut bus = self.bus.lock().map_err(|_| DriverError::PoisonedLock)?;
        bus.backlight_on()?;
        Ok(())
    }

    /// 关闭背光
    pub fn close_light(&self) -> Result<(), DriverError> {
        let mut bus = self.bus.lock().map_err(|_| DriverError::PoisonedLock)?;
        bus.backlight_off()?;
        Ok(())
    }
}
