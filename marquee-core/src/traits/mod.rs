//! Hardware and collaborator abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific or out-of-process implementations.

pub mod display;
pub mod media;
pub mod network;

pub use display::{CharacterPanel, DisplayError, GlyphBitmap, PanelError};
pub use media::{CollaboratorError, Endpoint, MediaService, TrackInfo, TransportState};
pub use network::{parse_key_values, NetworkReport, NetworkStatus};
