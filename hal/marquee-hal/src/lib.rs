//! Marquee Hardware Abstraction Layer
//!
//! This crate defines the GPIO traits the panel driver and the remote
//! receiver are written against. A backend (the Linux GPIO character
//! device in `marquee-controller`, or a recording mock in tests) hands out
//! lines on request; dropping a line releases it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  marquee-drivers (panel, receiver)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  marquee-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  gpiochip     │       │  test mocks   │
//! │  (cdev)       │       │               │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output
//! - [`gpio::EdgeInput`] - Rising-edge detected input
//! - [`gpio::LineProvider`] - Scoped claiming of numbered lines

#![deny(unsafe_code)]

pub mod gpio;

// Re-export key traits at crate root for convenience
pub use gpio::{EdgeInput, GpioError, LineProvider, OutputPin};
