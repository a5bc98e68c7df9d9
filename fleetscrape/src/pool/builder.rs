//! Builder for creating collectors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use super::settings::{CommandFailurePolicy, RunSettings, TranscriptCapture};
use super::Collector;
use crate::device::OsFamily;
use crate::dialect::{DialectDefinition, DialectRegistry};
use crate::error::{ConfigError, Result};
use crate::transport::{AuthMethod, Credentials, SshClientConfig, SshClientTransport, Transport};

/// Builder for constructing a [`Collector`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use fleetscrape::CollectorBuilder;
///
/// # fn example() -> Result<(), fleetscrape::Error> {
/// let collector = CollectorBuilder::new()
///     .username("netops")
///     .password("secret")
///     .workers(10)
///     .session_timeout(Duration::from_secs(120))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct CollectorBuilder<T: Transport = SshClientTransport> {
    transport: T,
    username: Option<String>,
    auth: AuthMethod,
    port: u16,
    settings: RunSettings,
    dialects: DialectRegistry,
    custom_dialects: Vec<(OsFamily, DialectDefinition)>,
}

impl CollectorBuilder<SshClientTransport> {
    /// Create a builder that connects with the local `ssh` client.
    pub fn new() -> Self {
        Self::with_transport(SshClientTransport::default())
    }

    /// Set the `ssh` client options.
    pub fn ssh_config(mut self, config: SshClientConfig) -> Self {
        self.transport = SshClientTransport::new(config);
        self
    }
}

impl Default for CollectorBuilder<SshClientTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> CollectorBuilder<T> {
    /// Create a builder around a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            username: None,
            auth: AuthMethod::None,
            port: 22,
            settings: RunSettings::default(),
            dialects: DialectRegistry::builtin(),
            custom_dialects: Vec::new(),
        }
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        let password: String = password.into();
        self.auth = AuthMethod::Password(SecretString::from(password));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
        };
        self
    }

    /// Set the default port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the number of concurrent sessions (default: 5).
    pub fn workers(mut self, workers: usize) -> Self {
        self.settings.workers = workers;
        self
    }

    /// Set the per-device session timeout (default: 180s).
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.settings.session_timeout = timeout;
        self
    }

    /// Set the mid-batch failure policy.
    pub fn on_command_failure(mut self, policy: CommandFailurePolicy) -> Self {
        self.settings.on_command_failure = policy;
        self
    }

    /// Write raw transcripts to `dir` according to `capture`.
    pub fn transcripts(mut self, capture: TranscriptCapture, dir: impl Into<PathBuf>) -> Self {
        self.settings.transcript_capture = capture;
        self.settings.transcript_dir = dir.into();
        self
    }

    /// Replace all run settings at once.
    pub fn settings(mut self, settings: RunSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the dialect used for `family`.
    pub fn dialect(mut self, family: OsFamily, dialect: DialectDefinition) -> Self {
        self.custom_dialects.push((family, dialect));
        self
    }

    /// Build the collector.
    ///
    /// This validates the configuration but does not contact any device.
    pub fn build(self) -> Result<Collector<T>> {
        let username = self
            .username
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidConfig {
                message: "Username is required".to_string(),
            })?;

        self.settings.validate()?;

        let mut dialects = self.dialects;
        for (family, dialect) in self.custom_dialects {
            dialects.register(family, dialect)?;
        }

        let credentials = Credentials {
            username,
            auth: self.auth,
            port: self.port,
        };

        Ok(Collector::new(
            Arc::new(self.transport),
            Arc::new(credentials),
            Arc::new(dialects),
            Arc::new(self.settings),
        ))
    }
}
