//! Marquee - character-panel media remote
//!
//! Usage: `marquee [CONFIG]`. The configuration defaults to
//! `/etc/marquee.toml`, falling back to the built-in defaults when that
//! file does not exist.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use marquee_controller::config::load_config;
use marquee_controller::{signals, Error};
use nix::unistd::geteuid;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_LOG_LEVEL: &str = "info";

type LogHandle = reload::Handle<EnvFilter, Registry>;

fn main() -> ExitCode {
    let log = init_logging();
    info!("Marquee {} starting", env!("CARGO_PKG_VERSION"));

    match run(log.as_ref()) {
        Ok(()) => {
            info!("Marquee stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Install the subscriber; `RUST_LOG` wins over the configured level
///
/// Returns a handle for applying the configured level, unless `RUST_LOG`
/// is set.
fn init_logging() -> Option<LogHandle> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let overridable = from_env.is_none();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    overridable.then_some(handle)
}

fn apply_log_level(log: Option<&LogHandle>, level: &str) {
    let Some(handle) = log else {
        return;
    };
    match EnvFilter::try_new(level) {
        Ok(filter) => {
            if let Err(e) = handle.reload(filter) {
                warn!("Failed to apply log level {:?}: {}", level, e);
            }
        }
        Err(e) => warn!("Invalid log level {:?}: {}", level, e),
    }
}

fn run(log: Option<&LogHandle>) -> Result<(), Error> {
    if !geteuid().is_root() {
        return Err(Error::NotRoot);
    }

    // Before any thread exists, so all of them inherit the blocked mask
    let shutdown = signals::install_shutdown_handler()?;

    let path = env::args_os().nth(1).map(PathBuf::from);
    let config = load_config(path.as_deref())?;
    apply_log_level(log, &config.log_level);

    start(&config, shutdown)
}

#[cfg(target_os = "linux")]
fn start(
    config: &marquee_core::config::MarqueeConfig,
    shutdown: std::sync::Arc<signals::Shutdown>,
) -> Result<(), Error> {
    marquee_controller::app::run(config, shutdown)
}

#[cfg(not(target_os = "linux"))]
fn start(
    _config: &marquee_core::config::MarqueeConfig,
    _shutdown: std::sync::Arc<signals::Shutdown>,
) -> Result<(), Error> {
    Err(Error::Unsupported)
}
