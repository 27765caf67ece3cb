//! Player selection: discover endpoints and list them

use std::rc::Rc;

use marquee_core::nav::Transition;
use marquee_core::traits::{DisplayError, Endpoint, MediaService, NetworkReport, NetworkStatus};
use tracing::{info, warn};

use super::menu::{Menu, MenuItem, MenuSource};
use super::player_menu::PlayerMenu;
use super::Ui;

const LOADING_ROW: usize = 1;
const STATUS_ROW: usize = 3;
const NO_PLAYERS: &str = "No players found";

/// Root menu listing discovered playback endpoints
pub struct PlayerSelection {
    media: Rc<dyn MediaService>,
    network: Rc<dyn NetworkStatus>,
}

impl PlayerSelection {
    pub fn new(media: Rc<dyn MediaService>, network: Rc<dyn NetworkStatus>) -> Self {
        Self { media, network }
    }

    /// Player selection wrapped in its menu screen
    pub fn screen(ui: Ui, media: Rc<dyn MediaService>, network: Rc<dyn NetworkStatus>) -> Menu<Self> {
        Menu::new(ui, Self::new(media, network))
    }

    /// One discovery attempt with the loading indicator up
    ///
    /// Returns the endpoints found (possibly none) and the network status
    /// text to show if there were none.
    fn attempt(&self, ui: &Ui) -> Result<(Vec<Endpoint>, String), DisplayError> {
        let rows = ui.rows();
        let loading = ui.show_loading(LOADING_ROW.min(rows.saturating_sub(1)))?;
        // Short panels skip the summary rather than write over the indicator
        let status_row = (STATUS_ROW < rows).then_some(STATUS_ROW);

        let blob = match self.network.status() {
            Ok(report) => {
                if let (Some(row), Some(summary)) = (status_row, report.summary()) {
                    ui.engine().set_row(row, &summary)?;
                }
                flatten(&report)
            }
            Err(e) => {
                warn!("Network status unavailable: {}", e);
                e.to_string()
            }
        };

        let found = match self.media.discover() {
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!("Discovery failed: {}", e);
                Vec::new()
            }
        };

        loading.finish();
        if let Some(row) = status_row {
            ui.engine().stop_row(row, true)?;
        }
        Ok((found, blob))
    }

    fn item(&self, ui: &Ui, endpoint: Endpoint) -> MenuItem {
        let media = self.media.clone();
        let ui = ui.clone();
        MenuItem::new(endpoint.name.clone(), move || {
            let target = match media.group_coordinator(&endpoint) {
                Ok(coordinator) => coordinator,
                Err(e) => {
                    warn!("No group coordinator for {}: {}", endpoint.name, e);
                    endpoint.clone()
                }
            };
            info!("Selected player {}", target.name);
            Ok(Transition::Push(Box::new(PlayerMenu::screen(
                ui.clone(),
                media.clone(),
                target,
            ))))
        })
    }
}

impl MenuSource for PlayerSelection {
    fn name(&self) -> &str {
        "player-selection"
    }

    fn options(&mut self, ui: &Ui) -> Result<Vec<MenuItem>, DisplayError> {
        let attempts = ui.config().discovery_attempts.max(1);

        for attempt in 1..=attempts {
            if ui.shutdown().is_requested() {
                info!("Discovery abandoned for shutdown");
                break;
            }
            let (endpoints, blob) = self.attempt(ui)?;
            if !endpoints.is_empty() {
                info!("Discovered {} players", endpoints.len());
                return Ok(endpoints.into_iter().map(|e| self.item(ui, e)).collect());
            }

            warn!("No players found (attempt {}/{})", attempt, attempts);
            if attempt == attempts {
                break;
            }

            {
                let mut frame = ui.frame();
                frame.clear()?;
                frame.insert(0, 0, &blob, true, true)?;
            }
            ui.shutdown().wait(ui.config().retry_backoff());
            ui.frame().clear()?;
        }

        Ok(Vec::new())
    }

    fn empty_notice(&self) -> Option<&str> {
        Some(NO_PLAYERS)
    }
}

/// Status text on one line
fn flatten(report: &NetworkReport) -> String {
    report.raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
