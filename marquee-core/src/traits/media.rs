//! Media endpoint collaborator
//!
//! The media player lives out of process. Every call may fail on the
//! network, so every call returns a `CollaboratorError` the caller must
//! handle locally.

use core::str::FromStr;

use thiserror::Error;

/// Failure of an out-of-process collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or refused the call
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    /// The call did not complete in time
    #[error("collaborator timed out")]
    Timeout,
    /// The reply could not be understood
    #[error("unexpected collaborator reply: {0}")]
    Protocol(String),
}

/// A playback endpoint as reported by discovery
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Human-readable display name (also the handle passed back to the service)
    pub name: String,
}

impl Endpoint {
    /// Create an endpoint handle from its display name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Current track metadata, all fields as reported by the endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Playback position, e.g. "0:01:23"
    pub position: String,
    /// Track duration, e.g. "0:04:56"
    pub duration: String,
}

/// Transport state of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
    Transitioning,
}

impl TransportState {
    /// Custom glyph slot used to draw this state on the status row
    ///
    /// Slot 0 is reserved as a blank glyph.
    pub fn glyph(self) -> u8 {
        match self {
            TransportState::Playing => 1,
            TransportState::Paused => 2,
            TransportState::Stopped => 3,
            TransportState::Transitioning => 4,
        }
    }

    /// Returns true when nothing is audible and the panel may go dark
    pub fn is_idle(self) -> bool {
        matches!(self, TransportState::Paused | TransportState::Stopped)
    }
}

impl FromStr for TransportState {
    type Err = CollaboratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PLAYING" => Ok(TransportState::Playing),
            "PAUSED_PLAYBACK" | "PAUSED" => Ok(TransportState::Paused),
            "STOPPED" => Ok(TransportState::Stopped),
            "TRANSITIONING" => Ok(TransportState::Transitioning),
            other => Err(CollaboratorError::Protocol(format!(
                "unknown transport state {other:?}"
            ))),
        }
    }
}

/// Operations consumed from the media endpoint collaborator
pub trait MediaService {
    /// Find the endpoints reachable on the local network
    fn discover(&self) -> Result<Vec<Endpoint>, CollaboratorError>;

    /// The endpoint coordinating the group `endpoint` belongs to
    fn group_coordinator(&self, endpoint: &Endpoint) -> Result<Endpoint, CollaboratorError>;

    fn play(&self, endpoint: &Endpoint) -> Result<(), CollaboratorError>;

    fn pause(&self, endpoint: &Endpoint) -> Result<(), CollaboratorError>;

    /// Volume in 0-100
    fn volume(&self, endpoint: &Endpoint) -> Result<i32, CollaboratorError>;

    fn set_volume(&self, endpoint: &Endpoint, volume: i32) -> Result<(), CollaboratorError>;

    fn track_info(&self, endpoint: &Endpoint) -> Result<TrackInfo, CollaboratorError>;

    fn transport_state(&self, endpoint: &Endpoint) -> Result<TransportState, CollaboratorError>;
}
