//! Character panel trait

use marquee_hal::GpioError;
use thiserror::Error;

/// Bitmap of one user-definable glyph: eight rows, five lit-pixel bits each
pub type GlyphBitmap = [u8; 8];

/// Errors raised by the panel protocol layer
///
/// `NotInitialized` and `InvalidAddress` are contract violations by the
/// caller, not transient conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// Operation attempted before `initialize()` completed
    #[error("panel has not been initialized")]
    NotInitialized,
    /// Row or column outside the panel geometry
    #[error("invalid panel address (row {row}, col {col})")]
    InvalidAddress { row: usize, col: usize },
    /// Glyph slot outside 0-7
    #[error("invalid glyph slot {0}")]
    InvalidGlyph(u8),
    /// The underlying GPIO backend failed
    #[error(transparent)]
    Gpio(#[from] GpioError),
}

/// Errors surfaced to screens by the display stack
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    /// Panel protocol misuse or backend failure
    #[error(transparent)]
    Panel(#[from] PanelError),
    /// The animation ticker did not acknowledge a pause in time
    #[error("animation ticker did not release row {row} in time")]
    HandshakeTimeout { row: usize },
}

/// Trait for a character-cell panel
///
/// This is the seam between the frame buffer (which owns the authoritative
/// cell contents) and the protocol driver that moves bytes to hardware.
pub trait CharacterPanel {
    /// Panel geometry as (rows, columns)
    fn dimensions(&self) -> (usize, usize);

    /// Position the write cursor at a logical cell
    fn move_to(&mut self, row: usize, col: usize) -> Result<(), PanelError>;

    /// Write one character code at the cursor (which then advances)
    fn write_data(&mut self, code: u8) -> Result<(), PanelError>;

    /// Blank the whole panel and home the cursor
    fn clear(&mut self) -> Result<(), PanelError>;

    /// Program one of the eight user-definable glyph slots
    fn load_glyph(&mut self, index: u8, bitmap: &GlyphBitmap) -> Result<(), PanelError>;

    /// Turn the display (and, when disabling, the backlight) on or off
    fn set_enabled(&mut self, on: bool) -> Result<(), PanelError>;

    /// Check if the display is enabled
    fn is_enabled(&self) -> bool;

    /// Turn the backlight on or off (lighting implies enabling the display)
    fn set_backlight(&mut self, on: bool) -> Result<(), PanelError>;

    /// Check if the backlight is on
    fn is_lit(&self) -> bool;

    /// Darken the panel and release its lines. Safe to call more than once.
    fn shutdown(&mut self);
}
