//! Screen trait and transition results

use core::fmt;

use crate::input::Button;
use crate::traits::DisplayError;

/// Outcome of a tick or button press on the active screen
pub enum Transition {
    /// Remain on the current screen
    Stay,
    /// Push a new screen on top of the current one
    Push(Box<dyn Screen>),
    /// Leave the current screen
    Pop,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Stay => f.write_str("Stay"),
            Transition::Push(screen) => write!(f, "Push({})", screen.name()),
            Transition::Pop => f.write_str("Pop"),
        }
    }
}

impl Transition {
    /// Returns true if applying this transition changes the stack
    pub fn is_change(&self) -> bool {
        !matches!(self, Transition::Stay)
    }
}

/// One navigable unit of the UI
///
/// Screens hold their own display handles; the stack only sequences the
/// lifecycle calls. `enter` runs every time the screen becomes the top of
/// the stack, `exit` every time it stops being the top.
pub trait Screen {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Screen became active
    fn enter(&mut self) -> Result<(), DisplayError>;

    /// Screen is about to stop being active
    fn exit(&mut self) -> Result<(), DisplayError>;

    /// Periodic update, called once per loop cycle
    fn tick(&mut self) -> Result<Transition, DisplayError> {
        Ok(Transition::Stay)
    }

    /// Handle one button press
    fn input(&mut self, button: Button) -> Result<Transition, DisplayError> {
        let _ = button;
        Ok(Transition::Stay)
    }
}
