//! Board-agnostic core logic for the panel controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (character panel, media and network
//!   collaborators)
//! - Remote button identities and events
//! - Navigation state machine (screen stack, menu cursor)
//! - Configuration type definitions

#![deny(unsafe_code)]

pub mod config;
pub mod input;
pub mod nav;
pub mod traits;

pub use input::{Button, ButtonEvent, InputError};
pub use nav::{MenuCursor, Screen, ScreenStack, Transition};
pub use traits::{CharacterPanel, DisplayError, PanelError};
