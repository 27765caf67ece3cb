//! Character grid in front of the panel
//!
//! The frame buffer owns the panel. Every cell write goes to the hardware
//! and to the in-memory grid, so the grid always mirrors what is displayed.

use std::sync::{Arc, Mutex, MutexGuard};

use heapless::Vec;
use marquee_core::config::{MAX_PANEL_COLS, MAX_PANEL_ROWS};
use marquee_core::traits::{CharacterPanel, PanelError};
use tracing::debug;

/// Code written for characters the panel's ROM cannot show
const UNPRINTABLE: u8 = b'?';

/// Outcome of a bounded write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Every character was written
    Complete,
    /// The text ran past the last cell it was allowed to use
    Truncated,
}

type Line = Vec<u8, MAX_PANEL_COLS>;

/// Authoritative cell grid plus row-addressed writes
pub struct FrameBuffer {
    panel: Box<dyn CharacterPanel + Send>,
    rows: usize,
    cols: usize,
    lines: Vec<Line, MAX_PANEL_ROWS>,
}

/// Frame buffer shared between the main loop and background writers
pub type SharedFrame = Arc<Mutex<FrameBuffer>>;

/// Lock a shared frame buffer, recovering it if a writer panicked
pub fn lock_frame(frame: &SharedFrame) -> MutexGuard<'_, FrameBuffer> {
    frame.lock().unwrap_or_else(|e| e.into_inner())
}

/// Panel code for a character
///
/// Custom glyph slots are `'\u{0}'..='\u{7}'`; everything up to `'\u{ff}'`
/// maps to the code of the same value.
pub fn encode(ch: char) -> u8 {
    u8::try_from(u32::from(ch)).unwrap_or(UNPRINTABLE)
}

impl FrameBuffer {
    /// Wrap an initialized panel; the grid starts blank
    pub fn new(panel: Box<dyn CharacterPanel + Send>) -> Result<Self, PanelError> {
        let (rows, cols) = panel.dimensions();
        if rows == 0 || rows > MAX_PANEL_ROWS || cols == 0 || cols > MAX_PANEL_COLS {
            return Err(PanelError::InvalidAddress { row: rows, col: cols });
        }

        let mut lines = Vec::new();
        for _ in 0..rows {
            let mut line = Line::new();
            // Capacity checked above
            let _ = line.resize(cols, b' ');
            let _ = lines.push(line);
        }

        Ok(Self {
            panel,
            rows,
            cols,
            lines,
        })
    }

    /// Create a shared handle
    pub fn into_shared(self) -> SharedFrame {
        Arc::new(Mutex::new(self))
    }

    /// Grid geometry as (rows, columns)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Direct access to the panel for mode and backlight control
    pub fn panel(&mut self) -> &mut dyn CharacterPanel {
        self.panel.as_mut()
    }

    /// Light or darken the panel
    pub fn set_backlight(&mut self, on: bool) -> Result<(), PanelError> {
        self.panel.set_backlight(on)
    }

    /// Enable or disable the panel
    pub fn set_enabled(&mut self, on: bool) -> Result<(), PanelError> {
        self.panel.set_enabled(on)
    }

    /// Write `text` starting at (`row`, `col`)
    ///
    /// With `wrap`, text that runs past the row continues at column 0 of the
    /// next row. With `clear`, every row the text touches is blanked first.
    /// Text that does not fit returns [`WriteStatus::Truncated`] after
    /// writing what fits.
    pub fn insert(
        &mut self,
        row: usize,
        col: usize,
        text: &str,
        clear: bool,
        wrap: bool,
    ) -> Result<WriteStatus, PanelError> {
        if row >= self.rows || col >= self.cols {
            return Err(PanelError::InvalidAddress { row, col });
        }

        if clear {
            self.clear_row(row)?;
        }

        let (mut r, mut c) = (row, col);
        self.panel.move_to(r, c)?;

        for ch in text.chars() {
            if c >= self.cols {
                if !wrap || r + 1 >= self.rows {
                    return Ok(WriteStatus::Truncated);
                }
                r += 1;
                c = 0;
                if clear {
                    self.clear_row(r)?;
                }
                self.panel.move_to(r, c)?;
            }

            let code = encode(ch);
            self.panel.write_data(code)?;
            self.lines[r][c] = code;
            c += 1;
        }

        Ok(WriteStatus::Complete)
    }

    /// Blank one row
    pub fn clear_row(&mut self, row: usize) -> Result<(), PanelError> {
        let blank: String = " ".repeat(self.cols);
        self.insert(row, 0, &blank, false, false).map(|_| ())
    }

    /// Blank the whole panel
    pub fn clear(&mut self) -> Result<(), PanelError> {
        self.panel.clear()?;
        for line in self.lines.iter_mut() {
            line.fill(b' ');
        }
        Ok(())
    }

    /// Current text of a row, one char per cell
    pub fn row_text(&self, row: usize) -> Option<String> {
        self.lines
            .get(row)
            .map(|line| line.iter().map(|&code| char::from(code)).collect())
    }

    /// Rewrite one row (or every row) from the grid
    ///
    /// Used after the panel has been re-initialized and lost its contents.
    pub fn redisplay(&mut self, row: Option<usize>) -> Result<(), PanelError> {
        let range = match row {
            Some(r) if r >= self.rows => return Err(PanelError::InvalidAddress { row: r, col: 0 }),
            Some(r) => r..r + 1,
            None => 0..self.rows,
        };

        for r in range {
            self.panel.move_to(r, 0)?;
            for c in 0..self.cols {
                let code = self.lines[r][c];
                self.panel.write_data(code)?;
            }
        }
        debug!("Redisplayed rows {:?}", row);
        Ok(())
    }

    /// Darken the panel and release its lines
    pub fn shutdown(&mut self) {
        self.panel.shutdown();
    }
}
