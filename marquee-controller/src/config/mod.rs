//! Configuration loading
//!
//! Loads the TOML configuration from disk, falling back to the embedded
//! defaults when the default file is absent.

pub mod loader;

pub use loader::{load_config, parse_config, ConfigError, DEFAULT_CONFIG_PATH, EMBEDDED_CONFIG};
