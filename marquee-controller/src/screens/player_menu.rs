//! Per-player menu

use std::rc::Rc;

use marquee_core::nav::Transition;
use marquee_core::traits::{DisplayError, Endpoint, MediaService};

use super::menu::{Menu, MenuItem, MenuSource};
use super::now_playing::NowPlaying;
use super::Ui;

/// Actions available for one endpoint
pub struct PlayerMenu {
    media: Rc<dyn MediaService>,
    endpoint: Endpoint,
}

impl PlayerMenu {
    pub fn new(media: Rc<dyn MediaService>, endpoint: Endpoint) -> Self {
        Self { media, endpoint }
    }

    pub fn screen(ui: Ui, media: Rc<dyn MediaService>, endpoint: Endpoint) -> Menu<Self> {
        Menu::new(ui, Self::new(media, endpoint))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl MenuSource for PlayerMenu {
    fn name(&self) -> &str {
        "player-menu"
    }

    fn options(&mut self, ui: &Ui) -> Result<Vec<MenuItem>, DisplayError> {
        let ui = ui.clone();
        let media = self.media.clone();
        let endpoint = self.endpoint.clone();

        Ok(vec![MenuItem::new("Now Playing", move || {
            Ok(Transition::Push(Box::new(NowPlaying::new(
                ui.clone(),
                media.clone(),
                endpoint.clone(),
            ))))
        })])
    }
}
