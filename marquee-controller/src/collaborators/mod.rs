//! Out-of-process collaborators
//!
//! The media endpoint and the network status are reached through local
//! helper commands that print `key=value` lines on stdout.

pub mod command;
pub mod media;
pub mod network;

pub use command::{HelperCommand, Reply};
pub use media::CommandMediaService;
pub use network::CommandNetworkStatus;
