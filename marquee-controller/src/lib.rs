//! Marquee controller
//!
//! Ties the panel, the animation engine and the remote receiver to the
//! navigation loop and the media screens.
//!
//! # Threads
//!
//! ```text
//! receiver watchers ──► InputDispatcher ──► EventQueue ──┐
//!                                                        ▼
//!                          EventLoop (main thread) ◄─────┘
//!                               │ screens
//!                               ▼
//! animation ticker ──► FrameBuffer ──► PanelDriver ──► gpiochip
//! loading workers  ──┘
//! ```

#![deny(unsafe_code)]

#[cfg(target_os = "linux")]
pub mod app;
pub mod channels;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod hw;
pub mod screens;
pub mod signals;
pub mod timer;

pub use channels::EventQueue;
pub use controller::EventLoop;
pub use error::Error;
pub use signals::Shutdown;
pub use timer::OneShotTimer;
