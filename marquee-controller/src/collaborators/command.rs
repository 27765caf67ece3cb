//! Helper command runner

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use marquee_core::traits::CollaboratorError;
use tracing::{debug, warn};

/// How often a running helper is checked for completion
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of one helper invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The helper exited with status zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// A local helper program invoked once per call
#[derive(Debug, Clone)]
pub struct HelperCommand {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl HelperCommand {
    pub fn new(program: impl Into<String>, base_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            base_args,
            timeout,
        }
    }

    /// Run the helper and capture its output, whatever its exit status
    ///
    /// Both pipes are drained while the helper runs, so it never stalls on
    /// a full pipe. A helper still running after the timeout is killed.
    pub fn exec(&self, args: &[&str]) -> Result<Reply, CollaboratorError> {
        debug!("Running {} {:?} {:?}", self.program, self.base_args, args);
        let mut child = Command::new(&self.program)
            .args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CollaboratorError::Unavailable(format!("{}: {e}", self.program)))?;
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!("{} timed out after {:?}", self.program, self.timeout);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(CollaboratorError::Timeout);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(CollaboratorError::Unavailable(e.to_string())),
            }
        };

        Ok(Reply {
            success: status.success(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }

    /// Run the helper and return stdout; a non-zero exit is a failure
    pub fn call(&self, args: &[&str]) -> Result<String, CollaboratorError> {
        let reply = self.exec(args)?;
        if !reply.success {
            let reason = reply.stderr.trim();
            return Err(CollaboratorError::Unavailable(if reason.is_empty() {
                format!("{} exited with an error", self.program)
            } else {
                reason.to_owned()
            }));
        }
        Ok(reply.stdout)
    }
}

/// Read a pipe to its end on a separate thread
///
/// A timed-out helper's readers are left to finish on their own when the
/// pipe closes.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut bytes) {
            warn!("Failed to read helper output: {}", e);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader.and_then(|r| r.join().ok()).unwrap_or_default()
}
