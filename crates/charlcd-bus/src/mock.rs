//! Mock 适配器（`mock` feature）
//!
//! 无硬件测试用：按完成顺序记录每一次设备操作，并带一个
//! 重入探测器 —— 如果两个操作在时间上重叠（互斥被破坏），
//! `overlap_detected()` 会返回 true。
//!
//! 适配器本体会被移动进 `Screen`，测试侧通过 [`MockHandle`]
//! （内部全是 `Arc`）继续观察与注入故障。

use crate::{BusDeviceError, BusDeviceErrorKind, BusError, LcdAdapter};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// 一次完成的设备操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOp {
    Init,
    Write { column: u8, row: u8, text: String },
    BacklightOn,
    BacklightOff,
}

/// 测试侧句柄（可克隆，适配器移动走之后仍然有效）
#[derive(Clone, Default)]
pub struct MockHandle {
    trace: Arc<Mutex<Vec<BusOp>>>,
    in_flight: Arc<AtomicBool>,
    overlap: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_light: Arc<AtomicBool>,
    op_delay_us: Arc<AtomicU64>,
}

impl MockHandle {
    /// 到目前为止完成的操作序列（快照）
    pub fn ops(&self) -> Vec<BusOp> {
        self.trace.lock().expect("mock trace poisoned").clone()
    }

    /// 是否观察到过两个设备操作在时间上重叠
    pub fn overlap_detected(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }

    /// 注入写入失败
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 注入背光操作失败
    pub fn set_fail_light(&self, fail: bool) {
        self.fail_light.store(fail, Ordering::SeqCst);
    }

    /// 每个操作的模拟耗时（默认 0，用于制造慢设备）
    pub fn set_op_delay(&self, delay: Duration) {
        self.op_delay_us.store(delay.as_micros() as u64, Ordering::SeqCst);
    }
}

/// Mock 显示适配器
#[derive(Default)]
pub struct MockLcdAdapter {
    handle: MockHandle,
    initialized: bool,
}

impl MockLcdAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }

    /// 操作体：重入探测 + 模拟耗时 + 记录
    fn run_op(&mut self, op: BusOp, fail: bool) -> Result<(), BusError> {
        if self.handle.in_flight.swap(true, Ordering::SeqCst) {
            self.handle.overlap.store(true, Ordering::SeqCst);
        }

        let delay_us = self.handle.op_delay_us.load(Ordering::SeqCst);
        if delay_us > 0 {
            std::thread::sleep(Duration::from_micros(delay_us));
        }

        let result = if fail {
            Err(BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::Busy,
                "injected failure",
            )))
        } else {
            self.handle.trace.lock().expect("mock trace poisoned").push(op);
            Ok(())
        };

        self.handle.in_flight.store(false, Ordering::SeqCst);
        result
    }
}

impl LcdAdapter for MockLcdAdapter {
    fn init(&mut self) -> Result<(), BusError> {
        self.run_op(BusOp::Init, false)?;
        self.initialized = true;
        Ok(())
    }

    fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), BusError> {
        if !self.initialized {
            return Err(BusError::NotInitialized);
        }
        let fail = self.handle.fail_writes.load(Ordering::SeqCst);
        self.run_op(
            BusOp::Write {
                column,
                row,
                text: text.to_string(),
            },
            fail,
        )
    }

    fn backlight_on(&mut self) -> Result<(), BusError> {
        let fail = self.handle.fail_light.load(Ordering::SeqCst);
        self.run_op(BusOp::BacklightOn, fail)
    }

    fn backlight_off(&mut self) -> Result<(), BusError> {
        let fail = self.handle.fail_light.load(Ordering::SeqCst);
        self.run_op(BusOp::BacklightOff, fail)
    }
}
