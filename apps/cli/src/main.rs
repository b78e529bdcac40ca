//! # charlcd CLI
//!
//! Command-line interface for character LCD control.
//!
//! ```bash
//! # 写一行文本（默认 /dev/i2c-1，地址 0x27，16x2）
//! charlcd-cli write --row 0 "Hello, world"
//!
//! # 指定配置文件和总线
//! charlcd-cli --config lcd.toml --bus 0 backlight on
//!
//! # 滚动演示（Ctrl-C 干净退出）
//! charlcd-cli demo --interval-ms 250
//! ```

use anyhow::{Context, Result};
use charlcd_driver::{Screen, ScreenBuilder, ScreenConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// charlcd CLI - 字符屏命令行工具
#[derive(Parser, Debug)]
#[command(name = "charlcd-cli")]
#[command(about = "Command-line interface for charlcd character LCD control", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML 配置文件路径（columns/rows/i2c_bus/i2c_addr）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖 I2C 总线号
    #[arg(long, global = true)]
    bus: Option<u8>,

    /// 覆盖设备地址（十进制或 0x 前缀十六进制）
    #[arg(long, global = true)]
    addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在指定位置写一段文本（整行覆写语义）
    Write {
        /// 目标行（0 起始）
        #[arg(short, long)]
        row: usize,

        /// 起始列（0 起始）
        #[arg(short, long, default_value_t = 0)]
        column: usize,

        /// 要写入的文本
        text: String,
    },

    /// 打开/关闭背光
    Backlight {
        #[arg(value_enum)]
        state: LightState,
    },

    /// 清空整个屏幕
    Clear,

    /// 滚动计数演示（Ctrl-C 退出）
    Demo {
        /// 帧间隔（毫秒）
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LightState {
    On,
    Off,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("charlcd_cli=info".parse().unwrap())
                .add_directive("charlcd_driver=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bus) = cli.bus {
        config.i2c_bus = bus;
    }
    if let Some(ref addr) = cli.addr {
        config.i2c_addr = parse_addr(addr)?;
    }

    let mut screen = ScreenBuilder::new()
        .config(config)
        .build()
        .context("failed to open the display")?;

    match cli.command {
        Commands::Write { row, column, text } => {
            screen.update(column, row, &text)?;
        },

        Commands::Backlight { state } => match state {
            LightState::On => screen.turn_on_light(),
            LightState::Off => screen.turn_off_light(),
        },

        Commands::Clear => {
            for row in 0..screen.rows() {
                screen.update(0, row, "")?;
            }
        },

        Commands::Demo { interval_ms } => {
            run_demo(&screen, Duration::from_millis(interval_ms))?;
        },
    }

    // 显式停机：排空队列、join worker，保证退出前命令都落到设备上
    screen.shutdown();
    Ok(())
}

/// 读取 TOML 配置；未指定时使用默认值（16x2，/dev/i2c-1，0x27）
fn load_config(path: Option<&Path>) -> Result<ScreenConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))
        },
        None => Ok(ScreenConfig::default()),
    }
}

/// 解析设备地址："39" 或 "0x27" 两种写法都接受
fn parse_addr(addr: &str) -> Result<u8> {
    let parsed = if let Some(hex) = addr.strip_prefix("0x").or_else(|| addr.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16)
    } else {
        addr.parse()
    };
    parsed.with_context(|| format!("invalid device address: {}", addr))
}

/// 滚动计数演示：两行独立刷新 + 周期性背光切换
fn run_demo(screen: &Screen, interval: Duration) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let running_handler = running.clone();
    ctrlc::set_handler(move || {
        running_handler.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    info!("demo started, press Ctrl-C to stop");
    screen.update(0, 0, "charlcd demo")?;
    screen.turn_on_light();

    let mut tick: u64 = 0;
    while running.load(Ordering::SeqCst) {
        if screen.rows() > 1 {
            screen.update(0, 1, &format!("tick {}", tick))?;
        }
        // 背光每 16 帧翻转一次，顺带演示 FIFO 通道
        if tick % 16 == 8 {
            screen.turn_off_light();
        } else if tick % 16 == 0 {
            screen.turn_on_light();
        }
        tick += 1;
        std::thread::sleep(interval);
    }

    info!("demo stopped after {} ticks", tick);
    screen.update(0, 0, "bye!")?;
    Ok(())
}
