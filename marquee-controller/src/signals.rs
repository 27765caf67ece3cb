//! Shutdown on SIGINT/SIGTERM
//!
//! The signals are blocked before any thread is spawned, so every thread
//! inherits the mask and only the dedicated waiter thread ever sees them.
//! The first signal sets the [`Shutdown`] request and wakes anything waiting
//! on it. A second one runs the registered forced-exit cleanup and exits.

use std::process;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use nix::sys::signal::{SigSet, Signal};
use tracing::{info, warn};

/// Exit status after a second signal interrupts a stuck shutdown
const FORCED_EXIT: i32 = 130;

type Cleanup = Box<dyn FnOnce() + Send>;

/// Shutdown request shared between the signal waiter and the main thread
#[derive(Default)]
pub struct Shutdown {
    requested: Mutex<bool>,
    wake: Condvar,
    cleanup: Mutex<Option<Cleanup>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_requested(&self) -> MutexGuard<'_, bool> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request shutdown and wake all waiters
    ///
    /// Returns false if shutdown had already been requested.
    pub fn request(&self) -> bool {
        let first = !std::mem::replace(&mut *self.lock_requested(), true);
        self.wake.notify_all();
        first
    }

    pub fn is_requested(&self) -> bool {
        *self.lock_requested()
    }

    /// Sleep for `timeout`, returning early with true if shutdown is requested
    pub fn wait(&self, timeout: Duration) -> bool {
        let (requested, _) = self
            .wake
            .wait_timeout_while(self.lock_requested(), timeout, |requested| !*requested)
            .unwrap_or_else(PoisonError::into_inner);
        *requested
    }

    /// Register what must still happen if the process is forced out
    ///
    /// Replaces any earlier registration.
    pub fn on_forced_exit(&self, cleanup: impl FnOnce() + Send + 'static) {
        *self.cleanup.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(cleanup));
    }

    /// Run the forced-exit cleanup, at most once
    pub fn run_forced_exit(&self) {
        let cleanup = self.cleanup.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

/// Block SIGINT and SIGTERM on the calling thread and start the waiter
///
/// Must run on the main thread before any other thread is spawned.
pub fn install_shutdown_handler() -> Result<Arc<Shutdown>, nix::Error> {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask.thread_block()?;

    let shutdown = Arc::new(Shutdown::new());
    let waiter = shutdown.clone();
    thread::spawn(move || loop {
        match mask.wait() {
            Ok(signal) if waiter.request() => info!("{:?} received, shutting down", signal),
            Ok(signal) => {
                warn!("{:?} during shutdown, exiting", signal);
                waiter.run_forced_exit();
                process::exit(FORCED_EXIT);
            }
            Err(e) => {
                warn!("Signal wait failed: {}", e);
                return;
            }
        }
    });

    Ok(shutdown)
}
