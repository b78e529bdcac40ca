//! worker 循环模块
//!
//! 每个显示行一个 [`row_loop`] 线程，外加一个 [`light_loop`] 线程。
//! 两种循环的失败策略一致：设备错误只记日志、不终止、不上抛 ——
//! 丢一帧不能让整个系统停摆（best-effort 显示）。

use crate::command::{LightCommand, RowUpdate};
use crate::gateway::DeviceGateway;
use crate::mailbox::Mailbox;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use tracing::{error, info, trace};

/// 行 worker 主循环
///
/// 阻塞在自己的邮箱上，把取到的（必然是最新的）请求经网关落到
/// 设备上，循环往复。只在邮箱关闭后退出（shutdown 路径）。
pub fn row_loop(row: usize, mailbox: Arc<Mailbox<RowUpdate>>, gateway: Arc<DeviceGateway>) {
    info!("starting row worker {}", row);
    while let Some(update) = mailbox.take() {
        if let Err(e) = gateway.write_row(update.column, row, &update.text) {
            // 失败的帧直接放弃：下一次 take 拿到的会是更新的请求
            error!("row {}: failed to apply update: {}", row, e);
        }
    }
    trace!("row worker {}: mailbox closed, exiting", row);
}

/// 背光 worker 主循环
///
/// 严格按提交顺序排空命令队列（与行邮箱不同：不合并、不丢弃，
/// 每条命令都必须被观察到）。发送端全部释放后退出。
pub fn light_loop(commands: Receiver<LightCommand>, gateway: Arc<DeviceGateway>) {
    info!("starting light worker");
    for command in commands.iter() {
        let result = match command {
            LightCommand::TurnOn => {
                info!("turning on the light");
                gateway.open_light()
            },
            LightCommand::TurnOff => {
                info!("turning off the light");
                gateway.close_light()
            },
        };
        if let Err(e) = result {
            error!("failed to apply light command {:?}: {}", command, e);
        }
    }
    trace!("light worker: command channel disconnected, exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use charlcd_bus::{BusOp, MockLcdAdapter};
    use std::thread;
    use std::time::Duration;

    fn test_gateway() -> (Arc<DeviceGateway>, charlcd_bus::MockHandle) {
        let mock = MockLcdAdapter::new();
        let handle = mock.handle();
        let gateway = Arc::new(DeviceGateway::new(Box::new(mock), 16).unwrap());
        (gateway, handle)
    }

    #[test]
    fn test_row_loop_exits_on_close() {
        let (gateway, handle) = test_gateway();
        let mailbox = Arc::new(Mailbox::new());

        let mailbox_clone = mailbox.clone();
        let worker = thread::spawn(move || row_loop(0, mailbox_clone, gateway));

        mailbox.put(RowUpdate::new(0, 0, "hello"));
        thread::sleep(Duration::from_millis(50));
        mailbox.close();
        worker.join().unwrap();

        assert!(handle.ops().iter().any(|op| matches!(
            op,
            BusOp::Write { text, .. } if text == "hello"
        )));
    }

    /// 设备错误不会终止行 worker
    #[test]
    fn test_row_loop_survives_device_error() {
        let (gateway, handle) = test_gateway();
        let mailbox = Arc::new(Mailbox::new());

        handle.set_fail_writes(true);
        let mailbox_clone = mailbox.clone();
        let worker = thread::spawn(move || row_loop(0, mailbox_clone, gateway));

        mailbox.put(RowUpdate::new(0, 0, "doomed"));
        thread::sleep(Duration::from_millis(50));

        handle.set_fail_writes(false);
        mailbox.put(RowUpdate::new(0, 0, "recovered"));
        thread::sleep(Duration::from_millis(50));

        mailbox.close();
        worker.join().unwrap();

        assert!(handle.ops().iter().any(|op| matches!(
            op,
            BusOp::Write { text, .. } if text == "recovered"
        )));
    }

    /// 背光命令严格 FIFO，且通道断开后 worker 退出
    #[test]
    fn test_light_loop_fifo_and_disconnect() {
        let (gateway, handle) = test_gateway();
        let (tx, rx) = crossbeam_channel::unbounded();

        let worker = thread::spawn(move || light_loop(rx, gateway));

        tx.send(LightCommand::TurnOn).unwrap();
        tx.send(LightCommand::TurnOff).unwrap();
        tx.send(LightCommand::TurnOn).unwrap();
        drop(tx);
        worker.join().unwrap();

        let lights: Vec<_> = handle
            .ops()
            .into_iter()
            .filter(|op| matches!(op, BusOp::BacklightOn | BusOp::BacklightOff))
            .collect();
        assert_eq!(
            lights,
            vec![BusOp::BacklightOn, BusOp::BacklightOff, BusOp::BacklightOn]
        );
    }

    /// 背光操作失败不终止 worker，后续命令照常处理
    #[test]
    fn test_light_loop_survives_device_error() {
        let (gateway, handle) = test_gateway();
        let (tx, rx) = crossbeam_channel::unbounded();

        handle.set_fail_light(true);
        let worker = thread::spawn(move || light_loop(rx, gateway));

        tx.send(LightCommand::TurnOn).unwrap();
        thread::sleep(Duration::from_millis(50));
        handle.set_fail_light(false);
        tx.send(LightCommand::TurnOff).unwrap();
        drop(tx);
        worker.join().unwrap();

        let lights: Vec<_> = handle
            .ops()
            .into_iter()
            .filter(|op| matches!(op, BusOp::BacklightOn | BusOp::BacklightOff))
            .collect();
        assert_eq!(lights, vec![BusOp::BacklightOff]);
    }
}
