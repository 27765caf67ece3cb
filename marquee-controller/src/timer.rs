//! One-shot cancellable timer
//!
//! Arming a timer that is already pending cancels the pending one first, so
//! at most one action is ever outstanding per timer.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{trace, warn};

#[derive(Default)]
struct CancelFlag {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

impl CancelFlag {
    fn set(&self) {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cv.notify_all();
    }

    /// Sleep up to `after`; true if the flag was set meanwhile
    fn wait(&self, after: Duration) -> bool {
        let guard = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .cv
            .wait_timeout_while(guard, after, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

struct TimerHandle {
    flag: Arc<CancelFlag>,
    worker: JoinHandle<()>,
}

/// Runs an action once after a delay unless cancelled first
#[derive(Default)]
pub struct OneShotTimer {
    pending: Option<TimerHandle>,
}

impl OneShotTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `after`, replacing any pending action
    pub fn arm<F>(&mut self, after: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let flag = Arc::new(CancelFlag::default());
        let waiter = flag.clone();
        let worker = thread::spawn(move || {
            if waiter.wait(after) {
                trace!("Timer cancelled");
                return;
            }
            action();
        });
        self.pending = Some(TimerHandle { flag, worker });
    }

    /// Cancel the pending action; returns true if one was still waiting
    pub fn cancel(&mut self) -> bool {
        let Some(handle) = self.pending.take() else {
            return false;
        };
        let waiting = !handle.worker.is_finished();
        handle.flag.set();
        if handle.worker.join().is_err() {
            warn!("Timer action panicked");
        }
        waiting
    }

    /// Check if an action is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|h| !h.worker.is_finished())
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let reader = count.clone();
        (count, move || reader.load(Ordering::SeqCst))
    }

    fn wait_until(f: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !f() {
            assert!(Instant::now() < deadline, "condition never held");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_fires_once() {
        let (count, read) = counter();
        let mut timer = OneShotTimer::new();
        timer.arm(Duration::from_millis(5), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        wait_until(|| read() == 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(read(), 1);
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_cancel_before_fire() {
        let (count, read) = counter();
        let mut timer = OneShotTimer::new();
        timer.arm(Duration::from_secs(10), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        assert!(timer.is_pending());
        let started = Instant::now();
        assert!(timer.cancel());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(read(), 0);
        assert!(!timer.cancel());
    }

    #[test]
    fn test_rearm_replaces_pending() {
        let (count, read) = counter();
        let mut timer = OneShotTimer::new();

        let first = count.clone();
        timer.arm(Duration::from_secs(10), move || {
            first.fetch_add(100, Ordering::SeqCst);
        });
        timer.arm(Duration::from_millis(5), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        wait_until(|| read() == 1);
        assert_eq!(read(), 1);
    }
}
