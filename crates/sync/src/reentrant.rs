//! 可重入锁
//!
//! 同一线程可以多次获取的锁，只有最外层的守卫释放时锁才真正释放。
//! 受保护的数据只能以共享引用访问，需要修改时配合 `Cell`/`RefCell` 使用。

use core::num::NonZeroUsize;

use lock_api::GetThreadId;

use crate::raw_spin_lock::RawSpinLock;

/// 以线程局部变量地址作为当前线程标识
///
/// 存活线程的线程局部变量地址互不相同，且必然非零。
#[derive(Debug)]
pub struct CurrentThreadId;

// SAFETY: 同一线程总是返回相同的地址，不同存活线程的地址不同。
unsafe impl GetThreadId for CurrentThreadId {
    const INIT: Self = CurrentThreadId;

    fn nonzero_thread_id(&self) -> NonZeroUsize {
        thread_local! {
            static KEY: u8 = const { 0 };
        }
        KEY.with(|key| {
            NonZeroUsize::new(key as *const u8 as usize).unwrap_or(NonZeroUsize::MIN)
        })
    }
}

/// 可重入自旋锁
///
/// # 示例
/// ```
/// use core::cell::Cell;
///
/// let lock = sync::ReentrantSpinLock::new(Cell::new(0));
/// let outer = lock.lock();
/// {
///     let inner = lock.lock(); // 同一线程再次获取不会死锁
///     inner.set(inner.get() + 1);
/// }
/// assert_eq!(outer.get(), 1);
/// ```
pub type ReentrantSpinLock<T> = lock_api::ReentrantMutex<RawSpinLock, CurrentThreadId, T>;

/// ReentrantSpinLock 的 RAII 保护器
pub type ReentrantSpinLockGuard<'a, T> =
    lock_api::ReentrantMutexGuard<'a, RawSpinLock, CurrentThreadId, T>;
