//! Now Playing screen
//!
//! Rows 0-2 carry title, artist and album through the animation engine.
//! The last panel row is the status line: transport glyph, position and
//! duration, or the volume bar for a short while after a volume change, or
//! the last collaborator error until the retry backoff runs out. Panels with
//! fewer than four rows drop album first, then artist.

use std::rc::Rc;
use std::time::Instant;

use marquee_core::input::Button;
use marquee_core::nav::{Screen, Transition};
use marquee_core::traits::{CollaboratorError, DisplayError, Endpoint, MediaService, TrackInfo, TransportState};
use marquee_display::lock_frame;
use tracing::{debug, warn};

use super::glyphs::{glyph_char, load_status_glyphs, BLOCK};
use super::Ui;
use crate::timer::OneShotTimer;

const TITLE_ROW: usize = 0;
const ARTIST_ROW: usize = 1;
const ALBUM_ROW: usize = 2;
/// Status row on a full-height panel
const STATUS_ROW: usize = 3;

const STATE_COL: usize = 0;
const POSITION_COL: usize = 3;
const DURATION_COL: usize = 10;

const VOLUME_LABEL: &str = "Vol ";
const VOLUME_MAX: i32 = 100;
/// Volume points per bar block
const VOLUME_PER_BLOCK: f64 = 6.0;

/// What is currently drawn, for skip-if-unchanged
#[derive(Debug, Default)]
struct Shown {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    state: Option<TransportState>,
    position: Option<String>,
    duration: Option<String>,
}

impl Shown {
    fn forget_status(&mut self) {
        self.state = None;
        self.position = None;
        self.duration = None;
    }
}

/// Track and transport display for one endpoint
pub struct NowPlaying {
    ui: Ui,
    media: Rc<dyn MediaService>,
    endpoint: Endpoint,
    status_row: usize,
    shown: Shown,
    last_poll: Option<Instant>,
    volume_until: Option<Instant>,
    retry_at: Option<Instant>,
    last_state: Option<TransportState>,
    backlight: OneShotTimer,
}

impl NowPlaying {
    pub fn new(ui: Ui, media: Rc<dyn MediaService>, endpoint: Endpoint) -> Self {
        let status_row = STATUS_ROW.min(ui.rows().saturating_sub(1));
        Self {
            ui,
            media,
            endpoint,
            status_row,
            shown: Shown::default(),
            last_poll: None,
            volume_until: None,
            retry_at: None,
            last_state: None,
            backlight: OneShotTimer::new(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Check if a collaborator error is holding the status line
    pub fn is_backing_off(&self) -> bool {
        self.retry_at.is_some()
    }

    fn poll(&self) -> Result<(TrackInfo, TransportState), CollaboratorError> {
        let info = self.media.track_info(&self.endpoint)?;
        let state = self.media.transport_state(&self.endpoint)?;
        Ok((info, state))
    }

    fn render(&mut self, info: &TrackInfo, state: TransportState, now: Instant) -> Result<(), DisplayError> {
        let engine = self.ui.engine();
        let fields = [
            (TITLE_ROW, &info.title, &mut self.shown.title),
            (ARTIST_ROW, &info.artist, &mut self.shown.artist),
            (ALBUM_ROW, &info.album, &mut self.shown.album),
        ];
        for (row, value, shown) in fields.into_iter().take(self.status_row) {
            if shown.as_ref() != Some(value) {
                engine.set_row(row, value)?;
                *shown = Some(value.clone());
            }
        }

        match self.volume_until {
            Some(until) if now < until => {}
            Some(_) => {
                self.volume_until = None;
                self.shown.forget_status();
                self.draw_status(info, state)?;
            }
            None => self.draw_status(info, state)?,
        }

        self.update_backlight(state)
    }

    fn draw_status(&mut self, info: &TrackInfo, state: TransportState) -> Result<(), DisplayError> {
        self.release_status_row()?;
        let mut frame = self.ui.frame();

        if self.shown.duration.as_ref() != Some(&info.duration) {
            frame.insert(self.status_row, DURATION_COL, &format!(" / {}", info.duration), false, false)?;
            self.shown.duration = Some(info.duration.clone());
        }
        if self.shown.position.as_ref() != Some(&info.position) {
            frame.insert(self.status_row, POSITION_COL, &info.position, false, false)?;
            self.shown.position = Some(info.position.clone());
        }
        if self.shown.state != Some(state) {
            let glyph = format!(" {} ", glyph_char(state.glyph()));
            frame.insert(self.status_row, STATE_COL, &glyph, false, false)?;
            self.shown.state = Some(state);
        }
        Ok(())
    }

    /// Arm the backlight-off timer on entering an idle state, cancel it on play
    fn update_backlight(&mut self, state: TransportState) -> Result<(), DisplayError> {
        let changed = self.last_state != Some(state);
        self.last_state = Some(state);

        if !state.is_idle() {
            self.backlight.cancel();
            self.ui.light()?;
        } else if changed {
            debug!("{} idle, backlight off in {:?}", self.endpoint.name, self.ui.config().backlight_off());
            let frame = self.ui.shared_frame();
            self.backlight.arm(self.ui.config().backlight_off(), move || {
                if let Err(e) = lock_frame(&frame).set_backlight(false) {
                    warn!("Failed to switch backlight off: {}", e);
                }
            });
        }
        Ok(())
    }

    /// Take the status row back from the ticker if an error is scrolling there
    fn release_status_row(&self) -> Result<(), DisplayError> {
        if self.ui.engine().is_row_enabled(self.status_row) {
            self.ui.engine().stop_row(self.status_row, true)?;
        }
        Ok(())
    }

    fn show_error(&mut self, error: &CollaboratorError, now: Instant) -> Result<(), DisplayError> {
        warn!("{}: {}", self.endpoint.name, error);
        self.ui.engine().set_row(self.status_row, &error.to_string())?;
        self.shown.forget_status();
        self.volume_until = None;
        self.retry_at = Some(now + self.ui.config().retry_backoff());
        Ok(())
    }

    fn change_volume(&self, up: bool) -> Result<i32, CollaboratorError> {
        let step = self.ui.config().volume_step;
        let current = self.media.volume(&self.endpoint)?;
        let volume = (if up { current + step } else { current - step }).clamp(0, VOLUME_MAX);
        self.media.set_volume(&self.endpoint, volume)?;
        Ok(volume)
    }

    fn draw_volume(&mut self, volume: i32) -> Result<(), DisplayError> {
        self.release_status_row()?;
        let mut frame = self.ui.frame();
        let cols = frame.cols();

        let blocks = ((f64::from(volume) / VOLUME_PER_BLOCK).round() as usize)
            .min(cols.saturating_sub(VOLUME_LABEL.len()));
        let bar: String = VOLUME_LABEL
            .chars()
            .chain(std::iter::repeat(BLOCK).take(blocks))
            .collect();
        frame.insert(self.status_row, 0, &format!("{bar:<cols$}"), false, false)?;
        self.shown.forget_status();
        Ok(())
    }

    fn toggle_playback(&self) -> Result<Result<(), CollaboratorError>, DisplayError> {
        let result = match self.media.transport_state(&self.endpoint) {
            Ok(TransportState::Playing) => self.media.pause(&self.endpoint),
            Ok(_) => {
                self.ui.light()?;
                self.media.play(&self.endpoint)
            }
            Err(e) => Err(e),
        };
        Ok(result)
    }
}

impl Screen for NowPlaying {
    fn name(&self) -> &str {
        "now-playing"
    }

    fn enter(&mut self) -> Result<(), DisplayError> {
        self.ui.light()?;
        self.ui.reset_rows()?;
        load_status_glyphs(&mut self.ui.frame())?;

        self.shown = Shown::default();
        self.last_poll = None;
        self.volume_until = None;
        self.retry_at = None;
        self.last_state = None;
        Ok(())
    }

    fn exit(&mut self) -> Result<(), DisplayError> {
        self.backlight.cancel();
        for row in [TITLE_ROW, ARTIST_ROW, ALBUM_ROW].into_iter().take(self.status_row) {
            self.ui.engine().stop_row(row, true)?;
        }
        self.release_status_row()?;
        self.ui.darken()?;
        Ok(())
    }

    fn tick(&mut self) -> Result<Transition, DisplayError> {
        let now = Instant::now();

        if let Some(at) = self.retry_at {
            if now < at {
                return Ok(Transition::Stay);
            }
            self.retry_at = None;
            self.ui.engine().stop_row(self.status_row, true)?;
            self.last_poll = None;
        }

        let due = self
            .last_poll
            .map_or(true, |at| now.duration_since(at) >= self.ui.config().poll_interval());
        if !due {
            return Ok(Transition::Stay);
        }
        self.last_poll = Some(now);

        match self.poll() {
            Ok((info, state)) => self.render(&info, state, now)?,
            Err(e) => self.show_error(&e, now)?,
        }
        Ok(Transition::Stay)
    }

    fn input(&mut self, button: Button) -> Result<Transition, DisplayError> {
        let now = Instant::now();
        match button {
            Button::Up | Button::Down => match self.change_volume(button == Button::Up) {
                Ok(volume) => {
                    self.draw_volume(volume)?;
                    self.volume_until = Some(now + self.ui.config().volume_overlay());
                }
                Err(e) => self.show_error(&e, now)?,
            },
            Button::Select => {
                if let Err(e) = self.toggle_playback()? {
                    self.show_error(&e, now)?;
                }
                self.last_poll = None;
            }
            Button::Back => return Ok(Transition::Pop),
        }
        Ok(Transition::Stay)
    }
}
