//! 互斥自旋锁
//!
//! 设备句柄的属性缓存等短临界区使用的锁。

use crate::raw_spin_lock::RawSpinLock;

/// 基于 [`RawSpinLock`] 的互斥锁
///
/// # 示例
/// ```
/// let cache = sync::SpinLock::new(Vec::new());
/// cache.lock().push("numa_node");
/// assert_eq!(cache.lock().len(), 1);
/// ```
///
/// # 注意
/// 不可重入，同一线程持有守卫时再次 `lock()` 会死锁。
pub type SpinLock<T> = lock_api::Mutex<RawSpinLock, T>;

/// [`SpinLock`] 的守卫，离开作用域时释放锁
pub type SpinLockGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinLock, T>;
