use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::cell::RefCell;
use std::sync::Arc;

use crate::errors::{CinderError, CinderResult, ErrorKind};

thread_local! {
    // writer locks held by the current thread, by address
    static HELD_WRITERS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// The single-writer lock of a record engine.
///
/// The lock is not reentrant. A thread that already holds it and asks for
/// it again, for example by issuing a plain write from inside a
/// transaction closure, gets [ErrorKind::InvalidOperation] instead of
/// blocking forever.
#[derive(Clone, Default)]
pub struct WriterLock {
    lock: Arc<Mutex<()>>,
}

impl WriterLock {
    pub fn new() -> Self {
        WriterLock::default()
    }

    /// Blocks until the lock is free, unless this thread already holds it.
    pub fn acquire(&self) -> CinderResult<WriterGuard> {
        let id = self.id();
        if HELD_WRITERS.with(|held| held.borrow().contains(&id)) {
            log::error!("A write scope is already open on this thread");
            return Err(CinderError::new(
                "A write scope is already open on this thread; use the enclosing transaction instead",
                ErrorKind::InvalidOperation,
            ));
        }

        let guard = self.lock.lock_arc();
        HELD_WRITERS.with(|held| held.borrow_mut().push(id));
        Ok(WriterGuard { id, _guard: guard })
    }

    /// Whether the current thread holds this lock.
    pub fn is_held_by_current_thread(&self) -> bool {
        let id = self.id();
        HELD_WRITERS.with(|held| held.borrow().contains(&id))
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.lock) as usize
    }
}

/// Holds a [WriterLock] until dropped. Not `Send`: the guard is released
/// on the thread that acquired it.
pub struct WriterGuard {
    id: usize,
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        HELD_WRITERS.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(position) = held.iter().position(|id| *id == self.id) {
                held.swap_remove(position);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn second_acquire_on_same_thread_fails() {
        let lock = WriterLock::new();
        let guard = lock.acquire().unwrap();
        assert!(lock.is_held_by_current_thread());

        let err = lock.acquire().err().map(|e| e.kind().clone());
        assert_eq!(err, Some(ErrorKind::InvalidOperation));

        drop(guard);
        assert!(!lock.is_held_by_current_thread());
        assert!(lock.acquire().is_ok());
    }

    #[test]
    fn distinct_locks_are_independent() {
        let a = WriterLock::new();
        let b = WriterLock::new();
        let _a = a.acquire().unwrap();
        assert!(b.acquire().is_ok());
    }

    #[test]
    fn other_threads_wait_for_release() {
        let lock = WriterLock::new();
        let guard = lock.acquire().unwrap();
        let acquired = Arc::new(AtomicBool::new(false));

        let handle = {
            let lock = lock.clone();
            let acquired = acquired.clone();
            thread::spawn(move || {
                let _guard = lock.acquire().unwrap();
                acquired.store(true, Ordering::Release);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::Acquire));
        drop(guard);
        handle.join().unwrap();
        assert!(acquired.load(Ordering::Acquire));
    }
}
