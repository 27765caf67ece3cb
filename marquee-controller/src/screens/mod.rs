//! Concrete screens
//!
//! Every screen gets a [`Ui`] handle through its constructor; nothing in
//! here reaches for global state.

pub mod glyphs;
pub mod menu;
pub mod now_playing;
pub mod player_menu;
pub mod player_select;

use std::sync::{Arc, MutexGuard};
use std::time::Duration;

use marquee_core::config::UiConfig;
use marquee_core::traits::{DisplayError, PanelError};
use marquee_display::{lock_frame, show_loading, AnimationEngine, FrameBuffer, LoadingHandle, SharedFrame};

pub use menu::{Menu, MenuItem, MenuSource};
pub use now_playing::NowPlaying;
pub use player_menu::PlayerMenu;
pub use player_select::PlayerSelection;

use crate::signals::Shutdown;

/// Display handles and timing shared by all screens
#[derive(Clone)]
pub struct Ui {
    engine: Arc<AnimationEngine>,
    config: UiConfig,
    loading_step: Duration,
    shutdown: Arc<Shutdown>,
}

impl Ui {
    pub fn new(
        engine: Arc<AnimationEngine>,
        config: UiConfig,
        loading_step: Duration,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            engine,
            config,
            loading_step,
            shutdown,
        }
    }

    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    /// Process shutdown request; long waits inside screens go through it
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Shared frame buffer handle, for background writers
    pub fn shared_frame(&self) -> SharedFrame {
        self.engine.frame().clone()
    }

    /// Lock the frame buffer
    ///
    /// Never call into the animation engine while holding this guard.
    pub fn frame(&self) -> MutexGuard<'_, FrameBuffer> {
        lock_frame(self.engine.frame())
    }

    /// Panel rows
    pub fn rows(&self) -> usize {
        self.frame().rows()
    }

    /// Light the panel (enabling it)
    pub fn light(&self) -> Result<(), PanelError> {
        self.frame().set_backlight(true)
    }

    /// Disable the panel (darkening it)
    pub fn darken(&self) -> Result<(), PanelError> {
        self.frame().set_enabled(false)
    }

    /// Start the loading indicator on `row`
    pub fn show_loading(&self, row: usize) -> Result<LoadingHandle, PanelError> {
        show_loading(self.shared_frame(), row, self.loading_step)
    }

    /// Stop every animated row and blank the panel rows
    pub fn reset_rows(&self) -> Result<(), DisplayError> {
        self.engine.stop_all(true)
    }
}
