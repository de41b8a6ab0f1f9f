use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use timer::Guard;

use crate::collection::{Query, QuerySnapshot};
use crate::common::schedule_task;
use crate::errors::{CinderError, CinderResult, ErrorKind};

struct ListenerState {
    active: AtomicBool,
    polls: AtomicU64,
    error: Mutex<Option<CinderError>>,
    guard: Mutex<Option<Guard>>,
}

impl ListenerState {
    fn new() -> Self {
        ListenerState {
            active: AtomicBool::new(true),
            polls: AtomicU64::new(0),
            error: Mutex::new(None),
            guard: Mutex::new(None),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn fail(&self, error: CinderError) {
        *self.error.lock() = Some(error);
        self.stop();
    }

    /// Cancels the scheduled task; safe to call from the task itself.
    fn stop(&self) {
        self.active.store(false, Ordering::Release);
        let guard = self.guard.lock().take();
        drop(guard);
    }

    fn attach(&self, guard: Guard) {
        *self.guard.lock() = Some(guard);
        // the first poll may have failed before the guard was stored
        if !self.is_active() {
            self.stop();
        }
    }
}

/// Handle of a running snapshot listener.
///
/// Polling stops when the registration is [unsubscribed](ListenerRegistration::unsubscribe)
/// or dropped. A poll that is already running when the listener stops
/// completes, but its result is not delivered.
///
/// A failed poll, or a callback that panics, stops the listener and
/// cancels its task; other listeners keep running.
pub struct ListenerRegistration {
    state: Arc<ListenerState>,
}

impl ListenerRegistration {
    /// `false` after unsubscribing or after a failed poll.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// The error that stopped the listener, if any.
    pub fn error(&self) -> Option<CinderError> {
        self.state.error.lock().clone()
    }

    /// Number of completed polls, successful or not.
    pub fn poll_count(&self) -> u64 {
        self.state.polls.load(Ordering::Acquire)
    }

    /// Stops polling. Returns the error of the failed poll when the
    /// listener had already stopped because of one.
    pub fn unsubscribe(self) -> CinderResult<()> {
        self.state.stop();
        match self.state.error.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.state.stop();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub(crate) fn listen<F>(query: Query, interval: Duration, mut callback: F) -> CinderResult<ListenerRegistration>
where
    F: FnMut(&QuerySnapshot) + Send + 'static,
{
    let state = Arc::new(ListenerState::new());
    let poll_state = state.clone();
    let mut last_result: Option<QuerySnapshot> = None;

    let guard = schedule_task(interval, move || {
        if !poll_state.is_active() {
            return;
        }

        let result = query.get();
        poll_state.polls.fetch_add(1, Ordering::AcqRel);
        match result {
            Ok(snapshot) => {
                if !poll_state.is_active() || last_result.as_ref() == Some(&snapshot) {
                    return;
                }
                // the callback runs on the shared timer thread
                match catch_unwind(AssertUnwindSafe(|| callback(&snapshot))) {
                    Ok(()) => last_result = Some(snapshot),
                    Err(payload) => {
                        let message = format!(
                            "Snapshot listener on {} panicked: {}",
                            query.path(),
                            panic_message(payload.as_ref())
                        );
                        log::error!("{}", message);
                        poll_state.fail(CinderError::new(&message, ErrorKind::InternalError));
                    }
                }
            }
            Err(error) => {
                log::error!("Snapshot listener on {} stopped: {}", query.path(), error);
                poll_state.fail(error);
            }
        }
    })?;
    state.attach(guard);

    log::debug!("Snapshot listener started with interval {:?}", interval);
    Ok(ListenerRegistration { state })
}
