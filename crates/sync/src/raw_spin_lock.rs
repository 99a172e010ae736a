//! 自旋锁实现
//!
//! 基于原子操作实现自旋锁机制，作为 `lock_api` 各类锁的底层原语。

use core::{
    hint,
    sync::atomic::{AtomicBool, Ordering},
};

use lock_api::{GuardSend, RawMutex};

/// 自旋若干次后仍未获取到锁时让出 CPU
const SPINS_BEFORE_YIELD: u32 = 64;

/// 自旋锁结构体，提供互斥访问临界区的能力。
///
/// 不可重入 (即不能在同一线程嵌套调用 `lock()`)，
/// 需要重入语义时使用 [`ReentrantSpinLock`](crate::ReentrantSpinLock)。
///
/// 临界区内可能发生阻塞的文件 I/O，因此自旋一段时间后会调用
/// [`std::thread::yield_now`] 让出时间片，而不是无限忙等。
#[derive(Debug)]
pub struct RawSpinLock {
    lock: AtomicBool,
}

impl RawSpinLock {
    /// 创建一个新的 RawSpinLock 实例。
    pub const fn new() -> Self {
        RawSpinLock {
            lock: AtomicBool::new(false),
        }
    }
}

impl Default for RawSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: 通过 Acquire/Release 的 compare_exchange 保证同一时刻只有一个持有者。
unsafe impl RawMutex for RawSpinLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = RawSpinLock::new();

    type GuardMarker = GuardSend;

    fn lock(&self) {
        let mut spins = 0;
        while self
            .lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            if spins < SPINS_BEFORE_YIELD {
                spins += 1;
                hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
    }

    fn try_lock(&self) -> bool {
        self.lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// 仅释放锁标志。
    unsafe fn unlock(&self) {
        self.lock.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Relaxed)
    }
}
