//! Integration tests for the spin lock primitives.

use std::cell::Cell;
use std::sync::Arc;
use std::thread;

use sync::{ReentrantSpinLock, SpinLock};

#[test]
fn test_spin_lock_mutual_exclusion() {
    let counter = Arc::new(SpinLock::new(0usize));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..1000 {
                    *counter.lock() += 1;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(*counter.lock(), 4000);
}

#[test]
fn test_spin_lock_try_lock_while_held() {
    let lock = SpinLock::new(());
    let guard = lock.lock();
    assert!(lock.try_lock().is_none());
    drop(guard);
    assert!(lock.try_lock().is_some());
}

#[test]
fn test_reentrant_nested_lock_same_thread() {
    let lock = ReentrantSpinLock::new(Cell::new(0));
    let outer = lock.lock();
    {
        let inner = lock.lock();
        inner.set(1);
        let innermost = lock.lock();
        innermost.set(innermost.get() + 1);
    }
    assert_eq!(outer.get(), 2);
}

#[test]
fn test_reentrant_released_after_outer_guard() {
    let lock = ReentrantSpinLock::new(Cell::new(0));
    {
        let _outer = lock.lock();
        let _inner = lock.lock();
        assert!(lock.is_locked());
    }
    assert!(!lock.is_locked());
}

#[test]
fn test_reentrant_excludes_other_threads() {
    let lock = Arc::new(ReentrantSpinLock::new(Cell::new(0u32)));
    let guard = lock.lock();

    let other = Arc::clone(&lock);
    let handle = thread::spawn(move || other.try_lock().is_none());
    assert!(handle.join().unwrap());

    drop(guard);
    let other = Arc::clone(&lock);
    let handle = thread::spawn(move || other.try_lock().is_some());
    assert!(handle.join().unwrap());
}
