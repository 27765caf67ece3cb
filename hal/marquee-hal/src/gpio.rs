//! GPIO pin abstractions
//!
//! Provides traits for digital output lines, edge-detected input lines and
//! the provider that claims them by number.

use std::time::Duration;

use thiserror::Error;

/// GPIO backend errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GpioError {
    /// The line does not exist on this chip
    #[error("GPIO line {0} is not available")]
    Unavailable(u32),
    /// The kernel refused the line request (usually already claimed)
    #[error("request for GPIO line {line} failed: {reason}")]
    Request { line: u32, reason: String },
    /// Reading an edge event failed
    #[error("GPIO I/O error: {0}")]
    Io(String),
}

/// Digital output pin
///
/// Implementations should handle the actual line manipulation for the
/// backend. Writes are infallible from the caller's side; a backend that can
/// fail reports the failure through its own logging.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// Input line configured for rising-edge detection
pub trait EdgeInput {
    /// Block until the next rising edge, or until `timeout` elapses.
    ///
    /// Returns `Ok(true)` if an edge arrived, `Ok(false)` on timeout.
    fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool, GpioError>;
}

/// Hands out numbered lines
///
/// A claimed line stays reserved until the returned handle is dropped, so
/// the lifetime of the handle is the lifetime of the reservation.
pub trait LineProvider {
    /// Output line handle
    type Output: OutputPin + Send;
    /// Edge-detected input line handle
    type Edges: EdgeInput + Send;

    /// Claim `line` as an output, initially low
    fn claim_output(&mut self, line: u32, consumer: &str) -> Result<Self::Output, GpioError>;

    /// Claim `line` as an input with rising-edge detection
    fn claim_rising_edges(&mut self, line: u32, consumer: &str)
        -> Result<Self::Edges, GpioError>;
}
