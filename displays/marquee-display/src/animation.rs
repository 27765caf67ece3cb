//! Marquee animation engine
//!
//! One ticker thread scrolls every enabled row whose content is wider than
//! the panel. Foreground writers take a row back with a pause/acknowledge
//! handshake: the row is disabled, then the caller waits until the ticker
//! has completed a full pass after the disable took effect. From then on
//! the ticker leaves the row alone until it is re-enabled.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use marquee_core::config::AnimationConfig;
use marquee_core::traits::{DisplayError, PanelError};
use tracing::{debug, trace, warn};

use crate::framebuffer::{lock_frame, SharedFrame};

/// Animation state of one row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowAnimation {
    /// Logical content, already padded for display
    pub content: String,
    /// Scroll offset in chars
    pub offset: usize,
    /// Whether the ticker may write this row
    pub enabled: bool,
}

impl RowAnimation {
    /// Check if the content needs scrolling on a `width`-wide row
    pub fn scrolls(&self, width: usize) -> bool {
        self.content.chars().count() > width
    }

    /// Window to draw this tick, advancing the offset
    ///
    /// Returns `None` (and leaves the offset alone) for content that fits.
    pub fn advance(&mut self, width: usize) -> Option<String> {
        let len = self.content.chars().count();
        if len <= width {
            return None;
        }
        let window = scroll_window(&self.content, self.offset, width);
        self.offset = (self.offset + 1) % len;
        Some(window)
    }
}

/// `width` chars of `content` starting at `offset`, wrapping circularly
pub fn scroll_window(content: &str, offset: usize, width: usize) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    (0..width)
        .map(|i| chars[(offset + i) % chars.len()])
        .collect()
}

/// Lay out row content for a `width`-wide row
///
/// Wide content gets one space either side so consecutive scroll cycles are
/// separated; narrow content is centered.
pub fn pad_content(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len > width {
        format!(" {value} ")
    } else {
        format!("{}{value}", " ".repeat((width - len) / 2))
    }
}

struct Rows {
    rows: Vec<RowAnimation>,
    /// Completed ticker passes
    pass: u64,
    running: bool,
}

struct Shared {
    frame: SharedFrame,
    rows: Mutex<Rows>,
    /// Notified at the end of every pass
    pass_done: Condvar,
    /// Wakes the ticker early on shutdown
    wake: Condvar,
    period: Duration,
    handshake_timeout: Duration,
    cols: usize,
}

impl Shared {
    fn lock_rows(&self) -> MutexGuard<'_, Rows> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background ticker for scrolling rows
pub struct AnimationEngine {
    shared: Arc<Shared>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl AnimationEngine {
    /// Start the ticker over a shared frame buffer
    pub fn start(frame: SharedFrame, config: &AnimationConfig) -> Self {
        let (rows, cols) = lock_frame(&frame).dimensions();
        let shared = Arc::new(Shared {
            frame,
            rows: Mutex::new(Rows {
                rows: vec![RowAnimation::default(); rows],
                pass: 0,
                running: true,
            }),
            pass_done: Condvar::new(),
            wake: Condvar::new(),
            period: config.period(),
            handshake_timeout: config.handshake_timeout(),
            cols,
        });

        let worker = shared.clone();
        let ticker = thread::spawn(move || run_ticker(&worker));
        debug!("Animation ticker started ({:?} period)", shared.period);

        Self {
            shared,
            ticker: Mutex::new(Some(ticker)),
        }
    }

    /// The frame buffer this engine draws into
    pub fn frame(&self) -> &SharedFrame {
        &self.shared.frame
    }

    /// Number of rows under animation control
    pub fn rows(&self) -> usize {
        self.shared.lock_rows().rows.len()
    }

    fn check_row(&self, row: usize, rows: &Rows) -> Result<(), DisplayError> {
        if row >= rows.rows.len() {
            return Err(PanelError::InvalidAddress { row, col: 0 }.into());
        }
        Ok(())
    }

    /// Disable a row and wait for the ticker to acknowledge
    ///
    /// Returns with the row table locked, so the ticker cannot start a pass
    /// before the caller has finished its write.
    fn pause(&self, row: usize) -> Result<MutexGuard<'_, Rows>, DisplayError> {
        let mut rows = self.shared.lock_rows();
        self.check_row(row, &rows)?;

        let was_enabled = std::mem::replace(&mut rows.rows[row].enabled, false);
        if !was_enabled || !rows.running {
            return Ok(rows);
        }

        let seen = rows.pass;
        let (rows, _) = self
            .shared
            .pass_done
            .wait_timeout_while(rows, self.shared.handshake_timeout, |r| {
                r.running && r.pass <= seen
            })
            .unwrap_or_else(PoisonError::into_inner);

        if rows.running && rows.pass <= seen {
            warn!("Animation ticker did not release row {}", row);
            return Err(DisplayError::HandshakeTimeout { row });
        }
        trace!("Row {} paused after pass {}", row, rows.pass);
        Ok(rows)
    }

    /// Replace a row's content and draw it
    ///
    /// Content wider than the panel is drawn from its first char and then
    /// scrolled by the ticker; narrow content is drawn centered and stays.
    pub fn set_row(&self, row: usize, content: &str) -> Result<(), DisplayError> {
        let mut rows = self.pause(row)?;
        let cols = self.shared.cols;

        let state = &mut rows.rows[row];
        state.content = pad_content(content, cols);
        state.offset = 0;

        let scrolls = state.scrolls(cols);
        let first = if scrolls {
            scroll_window(&state.content, 0, cols)
        } else {
            state.content.clone()
        };

        lock_frame(&self.shared.frame).insert(row, 0, &first, true, false)?;
        state.enabled = scrolls;
        Ok(())
    }

    /// Take a row away from the ticker
    ///
    /// With `clear` the row is blanked and its content forgotten; otherwise
    /// the content is redrawn once, statically, from its first char.
    pub fn stop_row(&self, row: usize, clear: bool) -> Result<(), DisplayError> {
        let mut rows = self.pause(row)?;
        let cols = self.shared.cols;
        let state = &mut rows.rows[row];
        state.offset = 0;

        let mut frame = lock_frame(&self.shared.frame);
        if clear {
            state.content.clear();
            frame.clear_row(row)?;
        } else {
            let still: String = state.content.chars().take(cols).collect();
            frame.insert(row, 0, &still, true, false)?;
        }
        Ok(())
    }

    /// Stop every row; `clear` as for [`AnimationEngine::stop_row`]
    pub fn stop_all(&self, clear: bool) -> Result<(), DisplayError> {
        for row in 0..self.rows() {
            self.stop_row(row, clear)?;
        }
        Ok(())
    }

    /// Logical (padded) content of a row
    pub fn row_content(&self, row: usize) -> Option<String> {
        self.shared
            .lock_rows()
            .rows
            .get(row)
            .map(|r| r.content.clone())
    }

    /// Check if the ticker currently owns a row
    pub fn is_row_enabled(&self, row: usize) -> bool {
        self.shared
            .lock_rows()
            .rows
            .get(row)
            .is_some_and(|r| r.enabled)
    }

    /// Number of completed ticker passes
    pub fn passes(&self) -> u64 {
        self.shared.lock_rows().pass
    }

    /// Stop the ticker and wait for it to exit; safe to call more than once
    pub fn shutdown(&self) {
        {
            let mut rows = self.shared.lock_rows();
            rows.running = false;
        }
        self.shared.wake.notify_all();
        self.shared.pass_done.notify_all();

        let handle = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Animation ticker panicked");
            }
            debug!("Animation ticker stopped");
        }
    }
}

impl Drop for AnimationEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_ticker(shared: &Shared) {
    let mut rows = shared.lock_rows();
    while rows.running {
        for (index, state) in rows.rows.iter_mut().enumerate() {
            if !state.enabled {
                continue;
            }
            if let Some(window) = state.advance(shared.cols) {
                let written = lock_frame(&shared.frame).insert(index, 0, &window, false, false);
                if let Err(e) = written {
                    warn!("Scroll of row {} failed: {}", index, e);
                }
            }
        }
        rows.pass = rows.pass.wrapping_add(1);
        shared.pass_done.notify_all();

        rows = shared
            .wake
            .wait_timeout_while(rows, shared.period, |r| r.running)
            .unwrap_or_else(PoisonError::into_inner)
            .0;
    }
}
