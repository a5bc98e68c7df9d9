//! Per-command and per-device results.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::command::CommandBatch;
use crate::device::DeviceProfile;
use crate::error::{CommandError, FailureKind, SessionError};

/// Output shown for a command that has no captured output.
pub const NO_OUTPUT_SENTINEL: &str = "(no output captured)";

/// Result of one command on one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// The command that was sent.
    pub command: String,

    /// Cleaned output. Empty when nothing could be attributed to the command.
    pub output: String,

    /// Time attributed to the command.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,

    /// Per-command anomaly, if any.
    pub error: Option<CommandError>,
}

impl ExecutionResult {
    /// Create a result with output and no anomaly.
    pub fn new(command: impl Into<String>, output: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            elapsed,
            error: None,
        }
    }

    /// Create a result carrying an anomaly.
    pub fn with_error(
        command: impl Into<String>,
        output: impl Into<String>,
        elapsed: Duration,
        error: CommandError,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            elapsed,
            error: Some(error),
        }
    }

    /// Check if the command produced output without any anomaly.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Output for display: the sentinel when nothing was captured, the
    /// cleaned output otherwise.
    pub fn display_output(&self) -> &str {
        match self.error {
            Some(CommandError::NoOutputCaptured { .. })
            | Some(CommandError::Skipped)
            | Some(CommandError::SessionFailed) => NO_OUTPUT_SENTINEL,
            _ => &self.output,
        }
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_output())
    }
}

/// Outcome for one device: one [`ExecutionResult`] per command of its batch.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceResult {
    /// The device.
    pub device: DeviceProfile,

    /// Results in batch order.
    pub results: Vec<ExecutionResult>,

    /// False only when the session failed as a whole.
    pub success: bool,

    /// Session failure message.
    pub error_message: Option<String>,

    /// Session failure classification.
    pub failure: Option<FailureKind>,

    /// Wall-clock time spent on the device.
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl DeviceResult {
    /// Result for a session that ran to completion.
    pub fn completed(
        device: DeviceProfile,
        results: Vec<ExecutionResult>,
        elapsed: Duration,
    ) -> Self {
        Self {
            device,
            results,
            success: true,
            error_message: None,
            failure: None,
            elapsed,
        }
    }

    /// Result for a failed session. Every command still gets a slot.
    pub fn failed(
        device: DeviceProfile,
        batch: &CommandBatch,
        error: &SessionError,
        elapsed: Duration,
    ) -> Self {
        let results = batch
            .iter()
            .map(|command| {
                ExecutionResult::with_error(
                    command,
                    "",
                    Duration::ZERO,
                    CommandError::SessionFailed,
                )
            })
            .collect();

        Self {
            device,
            results,
            success: false,
            error_message: Some(error.to_string()),
            failure: Some(error.kind()),
            elapsed,
        }
    }

    /// Number of commands with an anomaly.
    pub fn command_errors(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
