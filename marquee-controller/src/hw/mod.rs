//! Hardware backends

#[cfg(target_os = "linux")]
pub mod cdev;

#[cfg(target_os = "linux")]
pub use cdev::{CdevEdges, CdevOutput, CdevProvider};
