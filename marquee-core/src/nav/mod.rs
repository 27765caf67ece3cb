//! Navigation state machine
//!
//! Screens form a stack; only the top screen is active. Each tick or button
//! press yields an explicit [`Transition`] that the [`ScreenStack`] applies,
//! running the lifecycle hooks in a fixed order.

pub mod menu;
pub mod screen;
pub mod stack;

pub use menu::{MenuCursor, Redraw};
pub use screen::{Screen, Transition};
pub use stack::ScreenStack;
