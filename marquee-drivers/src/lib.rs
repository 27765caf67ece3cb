//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in marquee-core for the controller's hardware:
//!
//! - Character panel (HD44780-compatible controller on a 4-bit bus)
//! - Four-channel RF remote receiver (debounced, subscriber fan-out)

#![deny(unsafe_code)]

pub mod input;
pub mod panel;

pub use input::{InputDispatcher, RemoteReceiver, SubscriptionId, Target};
pub use panel::{PanelDriver, ShiftDirection};
