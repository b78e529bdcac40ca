//! HD44780 + PCF8574 I2C 后端（Linux only）
//!
//! 经典的 "I2C 背包板" 方案：PCF8574 扩展器的 8 个引脚接 LCD 的
//! RS/RW/EN/背光 + 高 4 位数据线，控制器工作在 4-bit 模式，
//! 每个字节拆成两个半字节、随 EN 脉冲打入。
//!
//! 时序常量取自 HD44780 数据手册；微秒级延迟使用 `spin_sleep`
//! （`std::thread::sleep` 的精度只有 1-2ms，不够用）。

use crate::{BusDeviceError, BusDeviceErrorKind, BusError, LcdAdapter};
use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use std::time::Duration;
use tracing::debug;

// PCF8574 引脚映射（常见背包板布局）
const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

// HD44780 指令
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // 光标右移，不滚屏
const CMD_DISPLAY_ON: u8 = 0x0C; // 显示开，光标关
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit，双行，5x8 点阵
const CMD_SET_DDRAM: u8 = 0x80;

/// 各行在 DDRAM 中的起始地址（最多 4 行，20x4 布局）
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// 计算 `(column, row)` 对应的 DDRAM 地址
pub const fn ddram_address(column: u8, row: u8) -> u8 {
    ROW_OFFSETS[(row & 3) as usize] + column
}

/// HD44780 over PCF8574 适配器
pub struct I2cLcdAdapter {
    dev: I2cdev,
    addr: u8,
    backlight: bool,
    initialized: bool,
}

impl I2cLcdAdapter {
    /// 打开 `/dev/i2c-{bus}` 上地址为 `addr` 的设备
    ///
    /// 只打开字符设备，不触碰 LCD 控制器；真正的上电初始化序列
    /// 在 [`LcdAdapter::init`] 中执行。
    pub fn open(bus: u8, addr: u8) -> Result<Self, BusError> {
        let path = format!("/dev/i2c-{}", bus);
        let dev = I2cdev::new(&path).map_err(|e| {
            BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::NotFound,
                format!("failed to open {}: {:?}", path, e),
            ))
        })?;
        debug!("opened {} (device address 0x{:02X})", path, addr);
        Ok(Self {
            dev,
            addr,
            backlight: true,
            initialized: false,
        })
    }

    fn backlight_bits(&self) -> u8 {
        if self.backlight { BACKLIGHT } else { 0 }
    }

    /// 向扩展器写一个字节（背光位始终随写保持）
    fn write_expander(&mut self, bits: u8) -> Result<(), BusError> {
        self.dev.write(self.addr, &[bits | self.backlight_bits()]).map_err(|e| {
            BusError::Device(BusDeviceError::new(
                BusDeviceErrorKind::Backend,
                format!("I2C write failed: {:?}", e),
            ))
        })
    }

    /// EN 脉冲：数据在 EN 下降沿被 LCD 锁存
    fn pulse(&mut self, bits: u8) -> Result<(), BusError> {
        self.write_expander(bits | EN)?;
        spin_sleep::sleep(Duration::from_micros(1));
        self.write_expander(bits & !EN)?;
        // 大部分指令的执行时间 ~37µs，留一点余量
        spin_sleep::sleep(Duration::from_micros(50));
        Ok(())
    }

    /// 发送一个完整字节：高半字节在前
    fn send(&mut self, value: u8, mode: u8) -> Result<(), BusError> {
        self.pulse((value & 0xF0) | mode)?;
        self.pulse(((value << 4) & 0xF0) | mode)
    }

    fn command(&mut self, cmd: u8) -> Result<(), BusError> {
        self.send(cmd, 0)
    }

    fn data(&mut self, byte: u8) -> Result<(), BusError> {
        self.send(byte, RS)
    }
}

impl LcdAdapter for I2cLcdAdapter {
    fn init(&mut self) -> Result<(), BusError> {
        // 上电等待
        spin_sleep::sleep(Duration::from_millis(50));

        // 4-bit 模式引导序列（数据手册规定：0x3 三次，再 0x2）
        self.pulse(0x30)?;
        spin_sleep::sleep(Duration::from_micros(4500));
        self.pulse(0x30)?;
        spin_sleep::sleep(Duration::from_micros(4500));
        self.pulse(0x30)?;
        spin_sleep::sleep(Duration::from_micros(150));
        self.pulse(0x20)?;

        self.command(CMD_FUNCTION_SET)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        // Clear 是最慢的指令
        spin_sleep::sleep(Duration::from_millis(2));
        self.command(CMD_ENTRY_MODE)?;

        self.initialized = true;
        debug!("HD44780 initialized (4-bit mode, address 0x{:02X})", self.addr);
        Ok(())
    }

    fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), BusError> {
        if !self.initialized {
            return Err(BusError::NotInitialized);
        }
        self.command(CMD_SET_DDRAM | ddram_address(column, row))?;
        for ch in text.chars() {
            // HD44780 A00 字符集只覆盖 ASCII，其余替换为 '?'
            let code = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.data(code)?;
        }
        Ok(())
    }

    fn backlight_on(&mut self) -> Result<(), BusError> {
        self.backlight = true;
        // 背光位直接由扩展器驱动，无需 EN 脉冲
        self.write_expander(0)
    }

    fn backlight_off(&mut self) -> Result<(), BusError> {
        self.backlight = false;
        self.write_expander(0)
    }
}
