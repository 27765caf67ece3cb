//! "Loading..." indicator
//!
//! A worker thread cycles three dots after a "Loading" label until it is
//! cancelled, then replaces the label with "Done". Cancellation is
//! cooperative: the token is polled ten times per wait, so the worker
//! stops within a tenth of a step and never in the middle of a write.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use marquee_core::traits::PanelError;
use tracing::{trace, warn};

use crate::framebuffer::{lock_frame, SharedFrame};

const LABEL: &str = "Loading";
const LABEL_COL: usize = 5;
const DOTS_COL: usize = 12;
const DOT_COUNT: usize = 3;
const DONE: &str = "Done";
const DONE_COL: usize = 8;

/// Polls of the cancellation token per wait
const POLLS_PER_WAIT: u32 = 10;

type CancelToken = Signal<CriticalSectionRawMutex, ()>;

/// Running loading indicator
///
/// Dropping the handle cancels the indicator and waits for the final
/// "Done" to be drawn.
pub struct LoadingHandle {
    cancel: Arc<CancelToken>,
    worker: Option<JoinHandle<()>>,
}

impl LoadingHandle {
    /// Request cancellation without waiting
    pub fn cancel(&self) {
        self.cancel.signal(());
    }

    /// Check if the worker has drawn "Done" and exited
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Cancel and wait for the worker to draw "Done"
    pub fn finish(mut self) {
        self.join();
    }

    fn join(&mut self) {
        self.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Loading indicator worker panicked");
            }
        }
    }
}

impl Drop for LoadingHandle {
    fn drop(&mut self) {
        self.join();
    }
}

/// Show "Loading" on `row` and animate it until the handle is cancelled
///
/// `step` is the pause before the dots start; each dot takes half a step.
pub fn show_loading(frame: SharedFrame, row: usize, step: Duration) -> Result<LoadingHandle, PanelError> {
    lock_frame(&frame).insert(row, LABEL_COL, LABEL, true, false)?;

    let cancel = Arc::new(CancelToken::new());
    let token = cancel.clone();
    let worker = thread::spawn(move || {
        animate(&frame, row, step, &token);
        if let Err(e) = lock_frame(&frame).insert(row, DONE_COL, DONE, true, false) {
            warn!("Failed to draw loading result on row {}: {}", row, e);
        }
        trace!("Loading indicator on row {} finished", row);
    });

    Ok(LoadingHandle {
        cancel,
        worker: Some(worker),
    })
}

/// Cycle the dots until cancelled
fn animate(frame: &SharedFrame, row: usize, step: Duration, token: &CancelToken) {
    let half = step / 2;
    let blank = " ".repeat(DOT_COUNT);

    loop {
        if draw(frame, row, DOTS_COL, &blank).is_err() || cancelled_during(step, token) {
            return;
        }
        for dot in 0..DOT_COUNT {
            if draw(frame, row, DOTS_COL + dot, ".").is_err() || cancelled_during(half, token) {
                return;
            }
        }
        if cancelled_during(half, token) {
            return;
        }
    }
}

fn draw(frame: &SharedFrame, row: usize, col: usize, text: &str) -> Result<(), PanelError> {
    lock_frame(frame)
        .insert(row, col, text, false, false)
        .map(|_| ())
        .inspect_err(|e| warn!("Loading indicator write failed: {}", e))
}

/// Wait `total`, polling the token; true if it fired
fn cancelled_during(total: Duration, token: &CancelToken) -> bool {
    let slice = total / POLLS_PER_WAIT;
    for _ in 0..POLLS_PER_WAIT {
        if token.signaled() {
            return true;
        }
        thread::sleep(slice);
    }
    token.signaled()
}
