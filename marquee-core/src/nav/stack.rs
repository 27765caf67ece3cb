//! Screen stack

use crate::input::Button;
use crate::traits::DisplayError;

use super::screen::{Screen, Transition};

/// Ordered stack of screens; the last element is active
///
/// Popping the last screen empties the stack, which ends navigation.
#[derive(Default)]
pub struct ScreenStack {
    screens: Vec<Box<dyn Screen>>,
}

impl ScreenStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the root screen and enter it
    ///
    /// Must be called on an empty stack.
    pub fn launch(&mut self, mut root: Box<dyn Screen>) -> Result<(), DisplayError> {
        debug_assert!(self.screens.is_empty(), "launch on a non-empty stack");
        root.enter()?;
        self.screens.push(root);
        Ok(())
    }

    /// Check if navigation has ended
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Number of screens on the stack
    pub fn depth(&self) -> usize {
        self.screens.len()
    }

    /// Name of the active screen
    pub fn active_name(&self) -> Option<&str> {
        self.screens.last().map(|s| s.name())
    }

    /// Tick the active screen and apply its transition
    pub fn tick(&mut self) -> Result<(), DisplayError> {
        let Some(top) = self.screens.last_mut() else {
            return Ok(());
        };
        let next = top.tick()?;
        self.apply(next)
    }

    /// Deliver a button press to the active screen and apply its transition
    pub fn input(&mut self, button: Button) -> Result<(), DisplayError> {
        let Some(top) = self.screens.last_mut() else {
            return Ok(());
        };
        let next = top.input(button)?;
        self.apply(next)
    }

    /// Apply a transition
    ///
    /// Order: `exit` on the current top, then push/pop, then `enter` on the
    /// new top (if any). `Stay` touches nothing.
    pub fn apply(&mut self, next: Transition) -> Result<(), DisplayError> {
        if !next.is_change() {
            return Ok(());
        }

        if let Some(top) = self.screens.last_mut() {
            top.exit()?;
        }

        match next {
            Transition::Stay => {}
            Transition::Push(screen) => self.screens.push(screen),
            Transition::Pop => {
                self.screens.pop();
            }
        }

        match self.screens.last_mut() {
            Some(top) => top.enter(),
            None => Ok(()),
        }
    }
}
