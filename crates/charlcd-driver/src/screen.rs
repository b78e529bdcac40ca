//! Screen API 模块
//!
//! 提供对外的 [`Screen`] 结构体，封装底层 worker 线程和排队细节。
//! 应用侧只看到三个操作：`update`、`turn_on_light`、`turn_off_light`。

use crate::command::{LightCommand, RowUpdate};
use crate::config::ScreenConfig;
use crate::error::{DriverError, ValidationError};
use crate::gateway::DeviceGateway;
use crate::mailbox::Mailbox;
use crate::pipeline::{light_loop, row_loop};
use charlcd_bus::LcdAdapter;
use crossbeam_channel::Sender;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, warn};

/// HD44780 DDRAM 能寻址的最大行数
pub const MAX_ROWS: usize = 4;
/// HD44780 DDRAM 能寻址的最大列数
pub const MAX_COLUMNS: usize = 40;

/// 多行字符屏调度器（对外 API）
///
/// 持有 `rows + 1` 个 worker 线程：每行一个（latest-wins 邮箱），
/// 背光一个（严格 FIFO 队列）。所有物理设备访问经由内部网关串行化。
///
/// `update` 永远立即返回：行内合并保证没有无界积压，提交快于
/// 设备消化时旧帧被静默丢弃，这是有意为之的行为而不是缺陷。
pub struct Screen {
    /// 每行一个邮箱，按行号索引
    mailboxes: Vec<Arc<Mailbox<RowUpdate>>>,
    /// 背光命令发送端
    ///
    /// 需要在 join worker **之前**真正 drop 掉 Sender，
    /// 否则接收端永远等不到 Disconnected。
    light_tx: ManuallyDrop<Sender<LightCommand>>,
    /// worker 线程句柄（shutdown 时 join）
    workers: Vec<JoinHandle<()>>,
    columns: usize,
    rows: usize,
    is_shut_down: bool,
}

impl Screen {
    /// 创建 `Screen` 并启动全部 worker 线程
    ///
    /// 适配器的 `init` 在这里（经网关构造）执行且只执行一次，
    /// 严格早于任何 worker 可能发出的设备调用。
    ///
    /// # Errors
    /// - `DriverError::InvalidConfig`: 尺寸超出 HD44780 可寻址范围
    /// - `DriverError::Bus`: 设备初始化失败
    /// - `DriverError::Thread`: worker 线程创建失败
    pub fn new(
        adapter: Box<dyn LcdAdapter + Send>,
        config: &ScreenConfig,
    ) -> Result<Self, DriverError> {
        if config.rows == 0 || config.rows > MAX_ROWS {
            return Err(DriverError::InvalidConfig(format!(
                "rows must be 1-{}, got {}",
                MAX_ROWS, config.rows
            )));
        }
        if config.columns == 0 || config.columns > MAX_COLUMNS {
            return Err(DriverError::InvalidConfig(format!(
                "columns must be 1-{}, got {}",
                MAX_COLUMNS, config.columns
            )));
        }

        let gateway = Arc::new(DeviceGateway::new(adapter, config.columns)?);

        let mailboxes: Vec<Arc<Mailbox<RowUpdate>>> =
            (0..config.rows).map(|_| Arc::new(Mailbox::new())).collect();
        let (light_tx, light_rx) = crossbeam_channel::unbounded();

        let mut screen = Self {
            mailboxes,
            light_tx: ManuallyDrop::new(light_tx),
            workers: Vec::with_capacity(config.rows + 1),
            columns: config.columns,
            rows: config.rows,
            is_shut_down: false,
        };

        for row in 0..config.rows {
            let mailbox = screen.mailboxes[row].clone();
            let gateway = gateway.clone();
            let handle = std::thread::Builder::new()
                .name(format!("charlcd-row-{}", row))
                .spawn(move || row_loop(row, mailbox, gateway));
            match handle {
                Ok(handle) => screen.workers.push(handle),
                Err(e) => {
                    // 已启动的 worker 在 shutdown 里收尾
                    screen.shutdown();
                    return Err(DriverError::Thread(e.to_string()));
                },
            }
        }

        let light_gateway = gateway.clone();
        let handle = std::thread::Builder::new()
            .name("charlcd-light".to_string())
            .spawn(move || light_loop(light_rx, light_gateway));
        match handle {
            Ok(handle) => screen.workers.push(handle),
            Err(e) => {
                screen.shutdown();
                return Err(DriverError::Thread(e.to_string()));
            },
        }

        Ok(screen)
    }

    /// 提交一次行更新
    ///
    /// 同步校验边界后投递到对应行的邮箱，立即返回。同一行上
    /// 尚未被消费的旧请求会被本次请求原子地替换（合并语义）。
    /// 最终一致：文本会在设备消化后出现在屏幕上。
    ///
    /// # Errors
    /// - `ValidationError`: 行号或 列号+文本长度 越界（唯一会
    ///   返回给调用方的错误；设备错误由 worker 内部消化）
    pub fn update(&self, column: usize, row: usize, text: &str) -> Result<(), ValidationError> {
        self.validate(column, row, text)?;
        self.mailboxes[row].put(RowUpdate::new(column, row, text));
        Ok(())
    }

    /// 打开背光（fire-and-forget，严格按提交顺序生效）
    pub fn turn_on_light(&self) {
        self.send_light(LightCommand::TurnOn);
    }

    /// 关闭背光（fire-and-forget，严格按提交顺序生效）
    pub fn turn_off_light(&self) {
        self.send_light(LightCommand::TurnOff);
    }

    fn send_light(&self, command: LightCommand) {
        // shutdown 之后发送端已被释放，不能再碰
        if self.is_shut_down {
            warn!("screen is shut down, dropping light command {:?}", command);
            return;
        }
        if self.light_tx.send(command).is_err() {
            warn!("light worker is gone, dropping light command {:?}", command);
        }
    }

    /// 配置的列数
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// 配置的行数
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn validate(&self, column: usize, row: usize, text: &str) -> Result<(), ValidationError> {
        if row >= self.rows {
            return Err(ValidationError::RowOutOfRange {
                row,
                max: self.rows - 1,
            });
        }
        // 按显示单元格计数（HD44780 一个字符一格），不是字节数
        let end = column + text.chars().count();
        if end > self.columns {
            return Err(ValidationError::SpanOutOfRange {
                end,
                columns: self.columns,
            });
        }
        Ok(())
    }

    /// 显式停机：关闭所有邮箱和命令通道，join 全部 worker。
    ///
    /// 幂等；`Drop` 也会调用，显式调用让测试可以确定性地收尾。
    /// 停机只在操作间隙生效：已经取走的请求会被完整地写完。
    pub fn shutdown(&mut self) {
        if self.is_shut_down {
            return;
        }
        self.is_shut_down = true;

        for mailbox in &self.mailboxes {
            mailbox.close();
        }

        // 关键：必须在 join 之前真正 drop 掉 Sender，
        // 否则 light worker 永远收不到 Disconnected。
        unsafe {
            ManuallyDrop::drop(&mut self.light_tx);
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charlcd_bus::MockLcdAdapter;

    fn test_screen(columns: usize, rows: usize) -> Screen {
        let config = ScreenConfig {
            columns,
            rows,
            ..ScreenConfig::default()
        };
        Screen::new(Box::new(MockLcdAdapter::new()), &config).unwrap()
    }

    #[test]
    fn test_update_row_out_of_range() {
        let screen = test_screen(16, 2);
        let result = screen.update(0, 2, "x");
        assert_eq!(
            result,
            Err(ValidationError::RowOutOfRange { row: 2, max: 1 })
        );
    }

    #[test]
    fn test_update_span_out_of_range() {
        let screen = test_screen(16, 2);
        // 12 + 5 = 17 > 16
        let result = screen.update(12, 0, "hello");
        assert_eq!(
            result,
            Err(ValidationError::SpanOutOfRange {
                end: 17,
                columns: 16
            })
        );
    }

    #[test]
    fn test_update_span_exactly_fits() {
        let screen = test_screen(16, 2);
        assert!(screen.update(11, 0, "hello").is_ok());
        assert!(screen.update(0, 0, &"x".repeat(16)).is_ok());
    }

    /// 边界按字符数算，不是字节数
    #[test]
    fn test_update_counts_chars_not_bytes() {
        let screen = test_screen(16, 2);
        // "héllo" 是 6 字节 5 个字符
        assert!(screen.update(11, 0, "héllo").is_ok());
    }

    #[test]
    fn test_new_rejects_bad_dimensions() {
        let config = ScreenConfig {
            rows: 0,
            ..ScreenConfig::default()
        };
        let result = Screen::new(Box::new(MockLcdAdapter::new()), &config);
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));

        let config = ScreenConfig {
            rows: 5,
            ..ScreenConfig::default()
        };
        let result = Screen::new(Box::new(MockLcdAdapter::new()), &config);
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));

        let config = ScreenConfig {
            columns: 41,
            ..ScreenConfig::default()
        };
        let result = Screen::new(Box::new(MockLcdAdapter::new()), &config);
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut screen = test_screen(16, 2);
        screen.shutdown();
        screen.shutdown();
        // Drop 再跑一次也安全
    }

    #[test]
    fn test_light_after_shutdown_does_not_panic() {
        let mut screen = test_screen(16, 2);
        screen.shutdown();
        screen.turn_on_light();
        screen.turn_off_light();
    }
}
