//! TOML configuration loader

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use marquee_core::config::{InvalidConfig, MarqueeConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where the configuration is looked for when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/marquee.toml";

/// Embedded default configuration (compiled into the binary)
pub const EMBEDDED_CONFIG: &str = include_str!("../../marquee.toml");

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read, or an explicit path is missing
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// TOML syntax or type error
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Parsed but rejected by validation
    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
}

/// Parse and validate configuration text
pub fn parse_config(text: &str) -> Result<MarqueeConfig, ConfigError> {
    let mut config: MarqueeConfig = toml::from_str(text)?;
    if config.clamp_backoff() {
        warn!(
            "retry_backoff_ms out of range, clamped to {}",
            config.ui.retry_backoff_ms
        );
    }
    config.validate()?;
    Ok(config)
}

/// Load configuration
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
/// tried and the embedded defaults are used if it does not exist.
pub fn load_config(path: Option<&Path>) -> Result<MarqueeConfig, ConfigError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
            info!("{} not found, using embedded configuration", path.display());
            return parse_config(EMBEDDED_CONFIG);
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };

    let config = parse_config(&text)?;
    info!("Loaded configuration from {}", path.display());
    debug!(
        "Panel {}x{} on {}, remote lines {:?}",
        config.panel.cols, config.panel.rows, config.panel.chip, config.remote.pins
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = parse_config(EMBEDDED_CONFIG).unwrap();
        assert_eq!(config, MarqueeConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = parse_config("[panel]\ncols = 16\nrows = 2\n").unwrap();
        assert_eq!(config.panel.cols, 16);
        assert_eq!(config.panel.rows, 2);
        assert_eq!(config.panel.rs, MarqueeConfig::default().panel.rs);
        assert_eq!(config.ui, MarqueeConfig::default().ui);
    }

    #[test]
    fn test_backoff_clamped() {
        let config = parse_config("[ui]\nretry_backoff_ms = 60000\n").unwrap();
        assert_eq!(config.ui.retry_backoff_ms, 10_000);
        let config = parse_config("[ui]\nretry_backoff_ms = 100\n").unwrap();
        assert_eq!(config.ui.retry_backoff_ms, 5_000);
    }

    #[test]
    fn test_invalid_rejected() {
        assert!(matches!(
            parse_config("[panel]\nrows = 6\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse_config("[panel]\ndata = [1, 2, 3]\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let missing = Path::new("/nonexistent/marquee.toml");
        assert!(matches!(
            load_config(Some(missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
