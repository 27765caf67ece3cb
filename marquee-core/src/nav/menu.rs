//! Menu selection and pagination
//!
//! Pure cursor arithmetic for list menus. The menu screen owns one of these
//! and redraws according to the returned [`Redraw`]. A page is one panel
//! height of options.

use crate::input::Button;

/// What a cursor step invalidated on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Redraw {
    /// The visible page changed; all option rows must be redrawn
    pub page: bool,
    /// The selection marker moved
    pub cursor: bool,
}

/// Selection state of a list menu
///
/// `selected` is what the user has chosen; `displayed` is where the marker
/// was last drawn. They differ only between a step and the next
/// [`MenuCursor::mark_drawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuCursor {
    len: usize,
    page: usize,
    selected: usize,
    displayed: usize,
}

impl Default for MenuCursor {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl MenuCursor {
    /// Cursor over `len` options shown `page` at a time, selection on the
    /// first
    pub fn new(len: usize, page: usize) -> Self {
        Self {
            len,
            page: page.max(1),
            selected: 0,
            displayed: 0,
        }
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.len
    }

    /// Options per page
    pub fn page_size(&self) -> usize {
        self.page
    }

    /// Check if the menu has no options
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Currently selected option index
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Option index where the marker is drawn
    pub fn displayed(&self) -> usize {
        self.displayed
    }

    /// First option index on the page holding the selection
    pub fn page_start(&self) -> usize {
        (self.selected / self.page) * self.page
    }

    /// Panel row of the selection within its page
    pub fn selected_row(&self) -> usize {
        self.selected % self.page
    }

    /// Panel row of the drawn marker within its page
    pub fn displayed_row(&self) -> usize {
        self.displayed % self.page
    }

    /// Move the selection one step for an arrow button, wrapping at both ends
    ///
    /// Non-arrow buttons and empty menus leave the cursor untouched.
    pub fn step(&mut self, button: Button) -> Redraw {
        if self.len == 0 || !button.is_arrow() {
            return Redraw::default();
        }

        self.selected = match button {
            Button::Down => (self.selected + 1) % self.len,
            _ => (self.selected + self.len - 1) % self.len,
        };

        Redraw {
            page: self.selected / self.page != self.displayed / self.page,
            cursor: self.selected != self.displayed,
        }
    }

    /// Record that the marker now sits on the selection
    pub fn mark_drawn(&mut self) {
        self.displayed = self.selected;
    }
}
