//! Hardware configuration types
//!
//! Line numbers are offsets on a GPIO character device (BCM numbering on a
//! Raspberry Pi header).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default GPIO character device
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Maximum panel rows addressable through the row table
pub const MAX_PANEL_ROWS: usize = 4;

/// Widest panel the two-line DDRAM layout can address
pub const MAX_PANEL_COLS: usize = 40;

/// Widest panel with more than two rows
///
/// Rows 2 and 3 share DDRAM lines with rows 0 and 1, splitting each line's
/// 40 cells between two rows.
pub const MAX_FOUR_ROW_COLS: usize = MAX_PANEL_COLS / 2;

/// Panel wiring and geometry (4-bit bus)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PanelConfig {
    /// GPIO character device holding the panel lines
    pub chip: String,
    /// Register-select line
    pub rs: u32,
    /// Enable/strobe line
    pub enable: u32,
    /// Data lines D4, D5, D6, D7
    pub data: [u32; 4],
    /// Backlight power line
    pub backlight: u32,
    /// Character rows
    pub rows: usize,
    /// Character columns
    pub cols: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            chip: DEFAULT_CHIP.to_owned(),
            rs: 24,
            enable: 25,
            data: [22, 27, 17, 4],
            backlight: 18,
            rows: 4,
            cols: 20,
        }
    }
}

/// Remote receiver wiring
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RemoteConfig {
    /// GPIO character device holding the receiver lines
    pub chip: String,
    /// Receiver channels A, B, C, D
    pub pins: [u32; 4],
    /// Minimum interval between accepted edges on one channel
    pub debounce_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            chip: DEFAULT_CHIP.to_owned(),
            pins: [7, 8, 15, 14],
            debounce_ms: 100,
        }
    }
}
