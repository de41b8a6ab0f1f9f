use crate::errors::{CinderError, CinderResult, ErrorKind};
use crate::SCHEDULER;
use std::time::Duration;
use timer::{Guard, Timer};

/// Schedules `f` to run every `interval` on the shared timer thread.
///
/// The task runs until the returned [Guard] is dropped.
#[inline]
pub fn schedule_task<F>(interval: Duration, f: F) -> CinderResult<Guard>
where
    F: 'static + FnMut() + Send,
{
    SCHEDULER.schedule(interval, f)
}

pub(crate) struct Scheduler {
    timer: Timer,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler { timer: Timer::new() }
    }

    #[inline]
    pub fn schedule<F>(&self, interval: Duration, f: F) -> CinderResult<Guard>
    where
        F: 'static + FnMut() + Send,
    {
        if interval.is_zero() {
            log::error!("Cannot schedule a task with a zero interval");
            return Err(CinderError::new(
                "Cannot schedule a task with a zero interval",
                ErrorKind::ValidationError,
            ));
        }

        match chrono::Duration::from_std(interval) {
            Ok(chrono_duration) => Ok(self.timer.schedule_repeating(chrono_duration, f)),
            Err(e) => {
                log::error!("Failed to convert duration to chrono::Duration: {}", e);
                Err(CinderError::new(
                    &format!("Invalid schedule interval {:?}: {}", interval, e),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use test_retry::retry;

    #[test]
    #[retry]
    fn test_schedule_task() {
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = Arc::clone(&flag);

        let _guard = schedule_task(Duration::from_millis(50), move || {
            flag_clone.store(true, Ordering::Relaxed);
        })
        .unwrap();

        awaitility::at_most(Duration::from_millis(500)).until(|| flag.load(Ordering::Relaxed));
    }

    #[test]
    #[retry]
    fn test_task_repeats_until_guard_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let guard = schedule_task(Duration::from_millis(20), move || {
            count_clone.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

        awaitility::at_most(Duration::from_millis(1000)).until(|| count.load(Ordering::Relaxed) >= 3);
        drop(guard);
        thread::sleep(Duration::from_millis(60));
        let after_drop = count.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(count.load(Ordering::Relaxed), after_drop);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = schedule_task(Duration::ZERO, || {})
            .err()
            .expect("zero interval should be rejected");
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }
}
