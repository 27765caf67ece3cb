//! List menu screen
//!
//! Options are laid out one panel height to a page with a `> ` marker in
//! the first two columns. The option list is rebuilt every time the menu is entered.

use marquee_core::input::Button;
use marquee_core::nav::{MenuCursor, Screen, Transition};
use marquee_core::traits::DisplayError;

use super::Ui;

/// Column where option labels start
const LABEL_COL: usize = 2;
const MARKER: &str = "> ";
const NO_MARKER: &str = "  ";

type Action = Box<dyn FnMut() -> Result<Transition, DisplayError>>;

/// One menu option: a label and what selecting it does
pub struct MenuItem {
    label: String,
    action: Action,
}

impl MenuItem {
    pub fn new<F>(label: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> Result<Transition, DisplayError> + 'static,
    {
        Self {
            label: label.into(),
            action: Box::new(action),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Supplies a menu's options
pub trait MenuSource {
    /// Screen name, for logs
    fn name(&self) -> &str;

    /// Build the option list; called on every `enter`
    fn options(&mut self, ui: &Ui) -> Result<Vec<MenuItem>, DisplayError>;

    /// Text shown on the first row when there are no options
    fn empty_notice(&self) -> Option<&str> {
        None
    }
}

/// Paged list menu
pub struct Menu<S> {
    ui: Ui,
    source: S,
    items: Vec<MenuItem>,
    cursor: MenuCursor,
}

impl<S: MenuSource> Menu<S> {
    pub fn new(ui: Ui, source: S) -> Self {
        Self {
            ui,
            source,
            items: Vec::new(),
            cursor: MenuCursor::default(),
        }
    }

    /// Labels of the current options
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(MenuItem::label)
    }

    pub fn selected(&self) -> usize {
        self.cursor.selected()
    }

    fn visible_rows(&self) -> usize {
        self.cursor.page_size()
    }

    fn draw_items(&mut self) -> Result<(), DisplayError> {
        let rows = self.visible_rows();
        let mut frame = self.ui.frame();

        if self.items.is_empty() {
            frame.clear_row(0)?;
            if let Some(notice) = self.source.empty_notice() {
                frame.insert(0, 0, notice, true, false)?;
            }
            for row in 1..rows {
                frame.clear_row(row)?;
            }
            return Ok(());
        }

        let start = self.cursor.page_start();
        for row in 0..rows {
            match self.items.get(start + row) {
                Some(item) => {
                    frame.insert(row, LABEL_COL, &item.label, true, false)?;
                }
                None => frame.clear_row(row)?,
            }
        }
        Ok(())
    }

    fn draw_cursor(&mut self) -> Result<(), DisplayError> {
        if self.items.is_empty() {
            return Ok(());
        }
        let rows = self.visible_rows();
        let mut frame = self.ui.frame();

        let old = self.cursor.displayed_row();
        if old < rows {
            frame.insert(old, 0, NO_MARKER, false, false)?;
        }
        let new = self.cursor.selected_row();
        if new < rows {
            frame.insert(new, 0, MARKER, false, false)?;
        }
        self.cursor.mark_drawn();
        Ok(())
    }

    fn select(&mut self) -> Result<Transition, DisplayError> {
        let index = self.cursor.selected();
        if index >= self.items.len() {
            return Ok(Transition::Stay);
        }

        {
            let keep = self.cursor.selected_row();
            let rows = self.visible_rows();
            let mut frame = self.ui.frame();
            for row in (0..rows).filter(|&r| r != keep) {
                frame.clear_row(row)?;
            }
        }

        let next = (self.items[index].action)()?;
        if !next.is_change() {
            self.draw_items()?;
            self.draw_cursor()?;
        }
        Ok(next)
    }
}

impl<S: MenuSource> Screen for Menu<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn enter(&mut self) -> Result<(), DisplayError> {
        self.ui.light()?;
        self.items = self.source.options(&self.ui)?;
        self.ui.reset_rows()?;
        self.cursor = MenuCursor::new(self.items.len(), self.ui.rows());
        self.draw_items()?;
        self.draw_cursor()
    }

    fn exit(&mut self) -> Result<(), DisplayError> {
        self.ui.darken()?;
        Ok(())
    }

    fn input(&mut self, button: Button) -> Result<Transition, DisplayError> {
        match button {
            Button::Up | Button::Down => {
                let redraw = self.cursor.step(button);
                if redraw.page {
                    self.draw_items()?;
                }
                if redraw.cursor {
                    self.draw_cursor()?;
                }
                Ok(Transition::Stay)
            }
            Button::Select => self.select(),
            Button::Back => Ok(Transition::Pop),
        }
    }
}
