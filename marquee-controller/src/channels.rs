//! Inter-thread communication
//!
//! Button edges are detected on the receiver watcher threads and consumed by
//! the event loop on the main thread. The queue is an unbounded FIFO: the
//! producer never blocks and no press is lost while the loop is busy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use marquee_core::input::ButtonEvent;
use tracing::warn;

/// Multi-producer, single-consumer button event queue
pub struct EventQueue {
    tx: Sender<ButtonEvent>,
    rx: Mutex<Receiver<ButtonEvent>>,
    pending: AtomicUsize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
        }
    }

    /// Enqueue without blocking; returns false if the event was dropped
    ///
    /// The queue owns both ends of its channel, so a send only fails while
    /// the queue itself is being torn down.
    pub fn push(&self, event: ButtonEvent) -> bool {
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                warn!("Event queue closed, dropping press on channel {}", event.pin);
                false
            }
        }
    }

    /// Dequeue the oldest event, if any
    pub fn pop(&self) -> Option<ButtonEvent> {
        let event = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_recv()
            .ok()?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(event)
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
