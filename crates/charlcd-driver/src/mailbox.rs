//! 单槽邮箱（latest-wins）
//!
//! 每个显示行一个：容量恰好为 1，`put` 原子地替换未消费的旧值。
//! 它不是 FIFO —— 它的意义在于保证 worker 永远不会把时间花在
//! 渲染一个已经过时的帧上。
//!
//! 「先清队列再入队」的两步写法在清和入之间存在丢新值的竞态，
//! 这里的 `put` 是单个临界区内的一次 `Option::replace`，不存在
//! 该竞态窗口。

use std::sync::{Condvar, Mutex};
use tracing::{error, trace};

struct Slot<T> {
    value: Option<T>,
    closed: bool,
}

/// 单槽、覆盖式邮箱
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    available: Condvar,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// 非阻塞投递：原子地安装 `value`，丢弃尚未被消费的旧值。
    ///
    /// 邮箱已关闭时投递是静默 no-op（关闭只发生在 shutdown 路径上）。
    pub fn put(&self, value: T) {
        match self.slot.lock() {
            Ok(mut slot) => {
                if slot.closed {
                    return;
                }
                if slot.value.replace(value).is_some() {
                    trace!("mailbox: pending value superseded");
                }
                drop(slot);
                self.available.notify_one();
            },
            Err(_) => {
                // 锁中毒：持锁方 panic。丢掉这次投递，不传播 panic。
                error!("mailbox lock poisoned, dropping value");
            },
        }
    }

    /// 阻塞取值：槽为空时挂起，直到有值或邮箱被关闭。
    ///
    /// 返回 `None` 表示邮箱已关闭且槽已排空 —— worker 以此退出循环。
    /// 关闭后残留的最后一个值仍会被取出（先排空，后退出）。
    pub fn take(&self) -> Option<T> {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(_) => {
                error!("mailbox lock poisoned, treating as closed");
                return None;
            },
        };
        loop {
            if let Some(value) = slot.value.take() {
                return Some(value);
            }
            if slot.closed {
                return None;
            }
            slot = match self.available.wait(slot) {
                Ok(slot) => slot,
                Err(_) => {
                    error!("mailbox lock poisoned during wait, treating as closed");
                    return None;
                },
            };
        }
    }

    /// 关闭邮箱并唤醒阻塞中的 taker（shutdown 钩子）
    pub fn close(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.closed = true;
        }
        self.available.notify_all();
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_put_then_take() {
        let mailbox = Mailbox::new();
        mailbox.put(1u32);
        assert_eq!(mailbox.take(), Some(1));
    }

    /// 覆盖律：连续投递时只有最新值存活
    #[test]
    fn test_put_overwrites_pending_value() {
        let mailbox = Mailbox::new();
        mailbox.put(1u32);
        mailbox.put(2);
        mailbox.put(3);
        assert_eq!(mailbox.take(), Some(3));
    }

    /// take 在空槽上阻塞，直到 put 唤醒
    #[test]
    fn test_take_blocks_until_put() {
        let mailbox = Arc::new(Mailbox::new());
        let mailbox_clone = mailbox.clone();

        let taker = thread::spawn(move || mailbox_clone.take());

        // 给 taker 时间进入等待
        thread::sleep(Duration::from_millis(50));
        mailbox.put(42u32);

        assert_eq!(taker.join().unwrap(), Some(42));
    }

    /// close 唤醒阻塞中的 taker 并让它返回 None
    #[test]
    fn test_close_wakes_blocked_taker() {
        let mailbox = Arc::new(Mailbox::<u32>::new());
        let mailbox_clone = mailbox.clone();

        let taker = thread::spawn(move || mailbox_clone.take());

        thread::sleep(Duration::from_millis(50));
        mailbox.close();

        assert_eq!(taker.join().unwrap(), None);
    }

    /// 关闭前投递的值仍会被排空，之后才返回 None
    #[test]
    fn test_close_drains_pending_value_first() {
        let mailbox = Mailbox::new();
        mailbox.put(7u32);
        mailbox.close();
        assert_eq!(mailbox.take(), Some(7));
        assert_eq!(mailbox.take(), None);
    }

    /// 关闭后的投递是 no-op
    #[test]
    fn test_put_after_close_is_dropped() {
        let mailbox = Mailbox::new();
        mailbox.close();
        mailbox.put(1u32);
        assert_eq!(mailbox.take(), None);
    }

    /// 并发 put/take 下不丢最新值：最后一次 put 的值一定可被观察到
    #[test]
    fn test_concurrent_put_take_latest_survives() {
        let mailbox = Arc::new(Mailbox::new());
        let producer_box = mailbox.clone();

        let producer = thread::spawn(move || {
            for i in 0..1000u32 {
                producer_box.put(i);
            }
            producer_box.close();
        });

        let mut last_seen = None;
        while let Some(value) = mailbox.take() {
            // 消费顺序单调：不会看到比已消费值更旧的值
            if let Some(prev) = last_seen {
                assert!(value > prev, "stale value {} after {}", value, prev);
            }
            last_seen = Some(value);
        }

        producer.join().unwrap();
        // 最后投递的 999 要么被中途消费覆盖律吞掉了更早的值，
        // 要么作为关闭前的残留被排空；但消费到的最后一个值必须是 999
        assert_eq!(last_seen, Some(999));
    }
}
