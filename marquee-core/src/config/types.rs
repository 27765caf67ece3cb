//! Configuration type definitions

use core::time::Duration;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::hardware::{
    PanelConfig, RemoteConfig, MAX_FOUR_ROW_COLS, MAX_PANEL_COLS, MAX_PANEL_ROWS,
};

/// Lower bound of the collaborator retry backoff
pub const MIN_RETRY_BACKOFF_MS: u64 = 5_000;

/// Upper bound of the collaborator retry backoff
pub const MAX_RETRY_BACKOFF_MS: u64 = 10_000;

/// Configuration rejected by validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {0}")]
pub struct InvalidConfig(pub String);

/// Marquee ticker settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnimationConfig {
    /// Ticker period
    pub period_ms: u64,
    /// Periods a foreground writer waits for the ticker before giving up
    pub handshake_periods: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            period_ms: 500,
            handshake_periods: 4,
        }
    }
}

impl AnimationConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Longest a pause handshake may take before it is treated as a fault
    pub fn handshake_timeout(&self) -> Duration {
        self.period() * self.handshake_periods
    }
}

/// Navigation loop and screen timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UiConfig {
    /// Sleep between loop cycles
    pub loop_interval_ms: u64,
    /// Minimum interval between media polls
    pub poll_interval_ms: u64,
    /// How long the volume bar replaces the status row
    pub volume_overlay_ms: u64,
    /// Delay before the backlight goes off while paused or stopped
    pub backlight_off_ms: u64,
    /// Wait after a collaborator failure before retrying
    pub retry_backoff_ms: u64,
    /// Volume change per button press
    pub volume_step: i32,
    /// Player discovery attempts before giving up
    pub discovery_attempts: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 50,
            poll_interval_ms: 500,
            volume_overlay_ms: 2_000,
            backlight_off_ms: 5_000,
            retry_backoff_ms: 10_000,
            volume_step: 5,
            discovery_attempts: 12,
        }
    }
}

impl UiConfig {
    pub fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn volume_overlay(&self) -> Duration {
        Duration::from_millis(self.volume_overlay_ms)
    }

    pub fn backlight_off(&self) -> Duration {
        Duration::from_millis(self.backlight_off_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Out-of-process collaborator helpers
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollaboratorConfig {
    /// Helper program answering media queries with `key=value` lines
    pub media_command: String,
    /// Program printing wireless status as `key=value` lines
    pub network_command: String,
    /// Arguments for the network status program
    pub network_args: Vec<String>,
    /// Per-call timeout
    pub timeout_ms: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            media_command: "/usr/local/bin/marquee-media".to_owned(),
            network_command: "/sbin/wpa_cli".to_owned(),
            network_args: vec!["status".to_owned()],
            timeout_ms: 5_000,
        }
    }
}

impl CollaboratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarqueeConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    pub panel: PanelConfig,
    pub remote: RemoteConfig,
    pub animation: AnimationConfig,
    pub ui: UiConfig,
    pub collaborators: CollaboratorConfig,
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            panel: PanelConfig::default(),
            remote: RemoteConfig::default(),
            animation: AnimationConfig::default(),
            ui: UiConfig::default(),
            collaborators: CollaboratorConfig::default(),
        }
    }
}

impl MarqueeConfig {
    /// Reject configurations the hardware or timing model cannot honor
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.panel.rows == 0 || self.panel.rows > MAX_PANEL_ROWS {
            return Err(InvalidConfig(format!(
                "panel rows must be 1-{MAX_PANEL_ROWS}, got {}",
                self.panel.rows
            )));
        }
        if self.panel.cols == 0 || self.panel.cols > MAX_PANEL_COLS {
            return Err(InvalidConfig(format!(
                "panel cols must be 1-{MAX_PANEL_COLS}, got {}",
                self.panel.cols
            )));
        }
        if self.panel.rows > 2 && self.panel.cols > MAX_FOUR_ROW_COLS {
            return Err(InvalidConfig(format!(
                "panels with more than two rows are at most {MAX_FOUR_ROW_COLS} cols wide, got {}",
                self.panel.cols
            )));
        }
        if self.animation.period_ms == 0 || self.animation.handshake_periods == 0 {
            return Err(InvalidConfig("animation timing must be non-zero".into()));
        }
        if self.ui.loop_interval_ms == 0 {
            return Err(InvalidConfig("loop interval must be non-zero".into()));
        }

        let mut lines: Vec<u32> = self.panel.data.to_vec();
        lines.extend([self.panel.rs, self.panel.enable, self.panel.backlight]);
        if self.remote.chip == self.panel.chip {
            lines.extend(self.remote.pins);
        }
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != lines.len() {
            return Err(InvalidConfig("a GPIO line is assigned twice".into()));
        }

        Ok(())
    }

    /// Pull the retry backoff into its allowed window
    ///
    /// Returns true if the value was changed.
    pub fn clamp_backoff(&mut self) -> bool {
        let clamped = self
            .ui
            .retry_backoff_ms
            .clamp(MIN_RETRY_BACKOFF_MS, MAX_RETRY_BACKOFF_MS);
        let changed = clamped != self.ui.retry_backoff_ms;
        self.ui.retry_backoff_ms = clamped;
        changed
    }
}
