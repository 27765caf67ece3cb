//! Top-level error type

use marquee_core::input::InputError;
use marquee_core::traits::{DisplayError, PanelError};
use marquee_hal::GpioError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that end the process
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    #[error("display error: {0}")]
    Display(#[from] DisplayError),

    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),

    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("signal setup failed: {0}")]
    Signal(#[from] nix::Error),

    #[error("must be run as root")]
    NotRoot,

    #[error("GPIO character devices are only available on Linux")]
    Unsupported,
}

impl Error {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::NotRoot => 5,
            Error::Config(_) => 2,
            _ => 1,
        }
    }
}
