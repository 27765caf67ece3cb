//! Network status from the wireless supplicant CLI

use marquee_core::config::CollaboratorConfig;
use marquee_core::traits::{CollaboratorError, NetworkReport, NetworkStatus};

use super::command::HelperCommand;

/// `wpa_cli status` (or any command printing the same `key=value` report)
pub struct CommandNetworkStatus {
    helper: HelperCommand,
}

impl CommandNetworkStatus {
    pub fn new(helper: HelperCommand) -> Self {
        Self { helper }
    }

    pub fn from_config(config: &CollaboratorConfig) -> Self {
        Self::new(HelperCommand::new(
            config.network_command.clone(),
            config.network_args.clone(),
            config.timeout(),
        ))
    }
}

impl NetworkStatus for CommandNetworkStatus {
    /// The report carries whatever the command printed, even when it
    /// failed, so the raw text can be shown to the user.
    fn status(&self) -> Result<NetworkReport, CollaboratorError> {
        let reply = self.helper.exec(&[])?;
        Ok(NetworkReport::from_raw(reply.stdout + &reply.stderr))
    }
}
