//! Character panel drivers

pub mod hd44780;

pub use hd44780::{PanelDriver, ShiftDirection};
