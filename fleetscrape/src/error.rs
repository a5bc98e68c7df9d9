//! Error types for fleetscrape.
//!
//! Errors are layered the same way the pipeline is: transport problems
//! (launching the local client), session problems (one device failed as a
//! whole), and configuration problems (rejected before a run starts).
//! Per-command anomalies never become an [`Error`]; they are carried as a
//! [`CommandError`] inside the command's result slot.

use std::fmt;
use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::OsFamily;

/// Main error type for fleetscrape operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Local transport client errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Device session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building or launching the local transport client.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The client process could not be started
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Password auth was requested without a credential helper
    #[error("Password authentication requires a credential helper such as sshpass")]
    MissingPasswordHelper,

    /// Pipe to or from the client process was not available
    #[error("Client process has no {0} pipe")]
    MissingPipe(&'static str),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session-level failures. Each one fails exactly one device.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Unreachable, refused, or authentication failure
    #[error("Connection to {host}:{port} failed: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    /// The overall session deadline expired
    #[error("Session with {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    /// The transport client failed locally
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Classify the failure for reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            SessionError::Timeout { .. } => FailureKind::Timeout,
            SessionError::Connection { .. } | SessionError::Transport(_) => {
                FailureKind::Connection
            }
        }
    }
}

/// Coarse classification of a failed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The device could not be reached or logged into.
    Connection,
    /// The session exceeded its wall-clock budget.
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Connection => f.write_str("connection"),
            FailureKind::Timeout => f.write_str("timeout"),
        }
    }
}

/// Configuration errors, raised before any device is contacted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid builder or settings value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The fallback command batch has no commands
    #[error("The default command batch must contain at least one command")]
    EmptyDefaultBatch,

    /// Unrecognized OS family tag
    #[error("Unknown OS family '{name}'")]
    UnknownFamily { name: String },

    /// A dialect was registered for the wrong family slot
    #[error("Dialect '{name}' does not match family {family}")]
    DialectMismatch { name: String, family: OsFamily },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Why a command slot holds no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOutputReason {
    /// The begin marker never appeared in the transcript.
    MarkersMissing,
    /// Both markers were found but nothing survived noise filtering.
    EmptySegment,
}

impl fmt::Display for NoOutputReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOutputReason::MarkersMissing => f.write_str("markers not found in transcript"),
            NoOutputReason::EmptySegment => f.write_str("empty segment"),
        }
    }
}

/// Per-command anomaly. Lives inside an `ExecutionResult` and never fails the device.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandError {
    /// End marker missing; output is a best-effort partial capture
    #[error("End marker missing, output may be truncated")]
    Truncated,

    /// Nothing could be attributed to this command
    #[error("No output captured ({reason})")]
    NoOutputCaptured { reason: NoOutputReason },

    /// Output matched one of the dialect's failure patterns
    #[error("Command failed: {pattern}")]
    Failed { pattern: String },

    /// Not sent because an earlier command failed
    #[error("Skipped after an earlier command failed")]
    Skipped,

    /// The device session failed before this command produced output
    #[error("Session failed")]
    SessionFailed,
}

/// Result type alias using fleetscrape's Error.
pub type Result<T> = std::result::Result<T, Error>;
