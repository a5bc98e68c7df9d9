//! Run-wide settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with the rest of a batch once a command's output matches a
/// failure pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandFailurePolicy {
    /// Keep sending; the failed command is flagged in its result.
    #[default]
    Continue,

    /// Stop sending. Every family is delivered paced so each command's
    /// output is seen before the next one goes out; the rest are skipped.
    AbortRemaining,
}

/// When raw transcripts are written to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptCapture {
    /// Never write transcripts.
    #[default]
    Never,

    /// Write the transcript of a session that failed or timed out.
    OnFailure,

    /// Write every transcript.
    Always,
}

/// Settings shared by every device of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Maximum number of simultaneous sessions.
    pub workers: usize,

    /// Wall-clock budget for one device session.
    #[serde(rename = "session_timeout_secs", with = "duration_secs")]
    pub session_timeout: Duration,

    /// Mid-batch failure handling.
    pub on_command_failure: CommandFailurePolicy,

    /// Transcript side channel policy.
    pub transcript_capture: TranscriptCapture,

    /// Directory for transcript files.
    pub transcript_dir: PathBuf,

    /// Bytes from the end of output searched for a prompt.
    pub search_depth: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            workers: 5,
            session_timeout: Duration::from_secs(180),
            on_command_failure: CommandFailurePolicy::default(),
            transcript_capture: TranscriptCapture::default(),
            transcript_dir: std::env::temp_dir().join("fleetscrape"),
            search_depth: 1000,
        }
    }
}

impl RunSettings {
    /// Reject values a run cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "workers must be at least 1".to_string(),
            });
        }
        if self.session_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig {
                message: "session timeout must be greater than zero".to_string(),
            });
        }
        if self.search_depth == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "search depth must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RunSettings::default();
        assert_eq!(settings.workers, 5);
        assert_eq!(settings.session_timeout, Duration::from_secs(180));
        assert_eq!(settings.on_command_failure, CommandFailurePolicy::Continue);
        assert_eq!(settings.transcript_capture, TranscriptCapture::Never);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: RunSettings = serde_json::from_str(
            r#"{"workers": 12, "session_timeout_secs": 60, "on_command_failure": "abort_remaining"}"#,
        )
        .unwrap();

        assert_eq!(settings.workers, 12);
        assert_eq!(settings.session_timeout, Duration::from_secs(60));
        assert_eq!(settings.on_command_failure, CommandFailurePolicy::AbortRemaining);
        assert_eq!(settings.search_depth, 1000);
    }

    #[test]
    fn test_serialize_timeout_as_seconds() {
        let json = serde_json::to_value(RunSettings::default()).unwrap();
        assert_eq!(json["session_timeout_secs"], 180);
        assert_eq!(json["transcript_capture"], "never");
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let settings = RunSettings {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));

        let settings = RunSettings {
            session_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
