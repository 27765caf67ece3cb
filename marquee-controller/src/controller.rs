//! Main event loop
//!
//! Single-threaded and cooperative: every cycle ticks the active screen,
//! drains all queued button presses through it, then waits out the loop
//! interval. Navigation ends when the last screen pops or shutdown is
//! requested.

use std::sync::Arc;
use std::time::Duration;

use marquee_core::nav::{Screen, ScreenStack};
use marquee_core::traits::DisplayError;
use tracing::{debug, info, warn};

use crate::channels::EventQueue;
use crate::signals::Shutdown;

/// Drives the screen stack from ticks and the button queue
pub struct EventLoop {
    stack: ScreenStack,
    queue: Arc<EventQueue>,
    interval: Duration,
    shutdown: Arc<Shutdown>,
}

impl EventLoop {
    pub fn new(queue: Arc<EventQueue>, interval: Duration, shutdown: Arc<Shutdown>) -> Self {
        Self {
            stack: ScreenStack::new(),
            queue,
            interval,
            shutdown,
        }
    }

    pub fn stack(&self) -> &ScreenStack {
        &self.stack
    }

    /// Push and enter the root screen
    pub fn launch(&mut self, root: Box<dyn Screen>) -> Result<(), DisplayError> {
        info!("Launching {}", root.name());
        self.stack.launch(root)
    }

    /// Run one cycle; returns false once the stack is empty
    pub fn run_cycle(&mut self) -> Result<bool, DisplayError> {
        let before = self.position();
        self.stack.tick()?;
        self.log_transition(before);

        while !self.stack.is_empty() {
            let Some(event) = self.queue.pop() else {
                break;
            };
            let Some(button) = event.button() else {
                warn!("Ignoring press on unknown channel {}", event.pin);
                continue;
            };

            let before = self.position();
            debug!("{:?} pressed", button);
            self.stack.input(button)?;
            self.log_transition(before);
        }

        Ok(!self.stack.is_empty())
    }

    /// Launch `root` and cycle until navigation ends or shutdown is requested
    pub fn run(&mut self, root: Box<dyn Screen>) -> Result<(), DisplayError> {
        self.launch(root)?;

        loop {
            if self.shutdown.is_requested() {
                info!("Shutdown requested");
                break;
            }
            if !self.run_cycle()? {
                info!("Navigation ended");
                break;
            }
            self.shutdown.wait(self.interval);
        }
        Ok(())
    }

    fn position(&self) -> (usize, String) {
        (
            self.stack.depth(),
            self.stack.active_name().unwrap_or("-").to_owned(),
        )
    }

    fn log_transition(&self, before: (usize, String)) {
        let after = self.position();
        if after != before {
            debug!("Screen {} -> {} (depth {})", before.1, after.1, after.0);
        }
    }
}
