//! 驱动层模块
//!
//! 多行字符屏的更新调度器，把大量并发调用方与一个慢速、严格串行的
//! 物理设备解耦：
//! - 每行一个 latest-wins 邮箱 + 专属 worker（行内合并，永不积压）
//! - 背光命令走无界 FIFO 队列 + 专属 worker（严格有序，一条不丢）
//! - 所有物理设备访问经由设备网关的单一互斥锁串行化
//!
//! # 使用场景
//!
//! ```no_run
//! use charlcd_driver::ScreenBuilder;
//!
//! let screen = ScreenBuilder::new().build().unwrap();
//! screen.update(0, 0, "Hello").unwrap();
//! screen.turn_on_light();
//! ```

mod builder;
pub mod command;
mod config;
mod error;
pub mod gateway;
pub mod mailbox;
pub mod pipeline;
mod screen;

pub use builder::ScreenBuilder;
pub use command::{LightCommand, RowUpdate};
pub use config::ScreenConfig;
pub use error::{DriverError, ValidationError};
pub use gateway::DeviceGateway;
pub use mailbox::Mailbox;
pub use screen::{MAX_COLUMNS, MAX_ROWS, Screen};

// 重新导出总线层常用类型
pub use charlcd_bus::{BusError, LcdAdapter};
