//! 同步原语
//!
//! 向设备发现模块提供基本的锁原语，包括：
//!
//! - [`RawSpinLock`] - 实现 [`lock_api::RawMutex`] 的自旋锁
//! - [`SpinLock`] - 保护数据的互斥自旋锁
//! - [`ReentrantSpinLock`] - 同一线程可重复获取的可重入锁
//!
//! 所有锁均基于 `lock_api`，守卫离开作用域时自动释放。

mod raw_spin_lock;
mod reentrant;
mod spin_lock;

pub use raw_spin_lock::*;
pub use reentrant::*;
pub use spin_lock::*;
