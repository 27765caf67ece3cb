//! Remote receiver buttons and the events they produce

use std::time::Instant;

use thiserror::Error;

/// Number of input lines on the remote receiver
pub const BUTTON_COUNT: usize = 4;

/// Input subscription errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    /// Subscription names neither a known pin nor the wildcard
    #[error("subscription must name a receiver pin or the wildcard")]
    InvalidSubscription,
}

/// Logical buttons of the four-channel remote
///
/// The receiver's channels are labelled A-D on the fob; each has a fixed
/// navigation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Channel A: select / OK / play-pause
    Select,
    /// Channel B: previous / up
    Up,
    /// Channel C: menu / back
    Back,
    /// Channel D: next / down
    Down,
}

// Receiver channel indices
const PIN_A: u8 = 0;
const PIN_B: u8 = 1;
const PIN_C: u8 = 2;
const PIN_D: u8 = 3;

impl Button {
    /// All buttons in receiver channel order
    pub const ALL: [Button; BUTTON_COUNT] = [Button::Select, Button::Up, Button::Back, Button::Down];

    /// Map a receiver channel index to its button
    pub fn from_pin(pin: u8) -> Option<Self> {
        match pin {
            PIN_A => Some(Button::Select),
            PIN_B => Some(Button::Up),
            PIN_C => Some(Button::Back),
            PIN_D => Some(Button::Down),
            _ => None,
        }
    }

    /// Receiver channel index of this button
    pub fn pin(self) -> u8 {
        match self {
            Button::Select => PIN_A,
            Button::Up => PIN_B,
            Button::Back => PIN_C,
            Button::Down => PIN_D,
        }
    }

    /// Returns true for the two cursor buttons
    pub fn is_arrow(self) -> bool {
        matches!(self, Button::Up | Button::Down)
    }

    /// Cursor movement as a signed delta (-1, 0, or +1)
    pub fn delta(self) -> i8 {
        match self {
            Button::Down => 1,
            Button::Up => -1,
            _ => 0,
        }
    }
}

/// A debounced press on one receiver channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Receiver channel index (0-3)
    pub pin: u8,
    /// When the edge was detected
    pub at: Instant,
}

impl ButtonEvent {
    /// Create an event for `pin` detected at `at`
    pub fn new(pin: u8, at: Instant) -> Self {
        Self { pin, at }
    }

    /// The logical button, if the pin is one of the four receiver channels
    pub fn button(&self) -> Option<Button> {
        Button::from_pin(self.pin)
    }
}
