//! Linux GPIO character device backend
//!
//! Lines are requested through `/dev/gpiochipN`. The kernel releases a
//! line when its handle is closed, so dropping a handle is the release.

use std::os::fd::{AsRawFd, BorrowedFd};
use std::time::Duration;

use embedded_hal::digital::OutputPin as _;
use linux_embedded_hal::gpio_cdev::{Chip, EventRequestFlags, LineEventHandle, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use marquee_hal::{EdgeInput, GpioError, LineProvider, OutputPin};
use nix::poll::{poll, PollFd, PollFlags};
use tracing::{debug, warn};

/// Lines of one GPIO chip
pub struct CdevProvider {
    chip: Chip,
    path: String,
}

impl CdevProvider {
    /// Open a GPIO character device, e.g. `/dev/gpiochip0`
    pub fn open(path: &str) -> Result<Self, GpioError> {
        let chip = Chip::new(path).map_err(|e| GpioError::Io(format!("{path}: {e}")))?;
        debug!("Opened {} ({} lines)", path, chip.num_lines());
        Ok(Self {
            chip,
            path: path.to_owned(),
        })
    }
}

impl LineProvider for CdevProvider {
    type Output = CdevOutput;
    type Edges = CdevEdges;

    fn claim_output(&mut self, line: u32, consumer: &str) -> Result<CdevOutput, GpioError> {
        let handle = self
            .chip
            .get_line(line)
            .map_err(|_| GpioError::Unavailable(line))?
            .request(LineRequestFlags::OUTPUT, 0, consumer)
            .map_err(|e| GpioError::Request {
                line,
                reason: e.to_string(),
            })?;
        let pin = CdevPin::new(handle).map_err(|e| GpioError::Request {
            line,
            reason: e.to_string(),
        })?;
        Ok(CdevOutput { pin, line })
    }

    fn claim_rising_edges(&mut self, line: u32, consumer: &str) -> Result<CdevEdges, GpioError> {
        let events = self
            .chip
            .get_line(line)
            .map_err(|_| GpioError::Unavailable(line))?
            .events(
                LineRequestFlags::INPUT,
                EventRequestFlags::RISING_EDGE,
                consumer,
            )
            .map_err(|e| GpioError::Request {
                line,
                reason: format!("{} on {}", e, self.path),
            })?;
        Ok(CdevEdges { events, line })
    }
}

/// Output line
pub struct CdevOutput {
    pin: CdevPin,
    line: u32,
}

impl OutputPin for CdevOutput {
    fn set_high(&mut self) {
        if let Err(e) = self.pin.set_high() {
            warn!("GPIO {} set high failed: {:?}", self.line, e);
        }
    }

    fn set_low(&mut self) {
        if let Err(e) = self.pin.set_low() {
            warn!("GPIO {} set low failed: {:?}", self.line, e);
        }
    }
}

/// Rising-edge input line
pub struct CdevEdges {
    events: LineEventHandle,
    line: u32,
}

impl EdgeInput for CdevEdges {
    fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool, GpioError> {
        let ready = {
            // SAFETY: the descriptor belongs to `self.events`, which outlives
            // this borrow.
            #[allow(unsafe_code)]
            let fd = unsafe { BorrowedFd::borrow_raw(self.events.as_raw_fd()) };
            let mut fds = [PollFd::new(&fd, PollFlags::POLLIN)];
            let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
            poll(&mut fds, millis).map_err(|e| GpioError::Io(format!("line {}: {e}", self.line)))?
        };
        if ready == 0 {
            return Ok(false);
        }

        // Only rising edges were requested, so any event is one
        self.events
            .get_event()
            .map(|_| true)
            .map_err(|e| GpioError::Io(format!("line {}: {e}", self.line)))
    }
}
