//! Transport client configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    /// This is the default and matches common SSH client behavior.
    #[default]
    AcceptNew,

    /// Accept all keys without checking and record nothing. For lab use only.
    Disabled,
}

impl HostKeyVerification {
    /// Value for the client's `StrictHostKeyChecking` option.
    pub fn as_option_value(&self) -> &'static str {
        match self {
            HostKeyVerification::Strict => "yes",
            HostKeyVerification::AcceptNew => "accept-new",
            HostKeyVerification::Disabled => "no",
        }
    }
}

/// Authentication method, applied uniformly to every device in a run.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Leave authentication to the client (agent, default identities).
    None,

    /// Password authentication through a credential helper.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
    },
}

/// Credentials shared by every device of a run.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Login name.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Port used for devices that do not set their own.
    pub port: u16,
}

impl Credentials {
    /// Password credentials on the default port.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth: AuthMethod::Password(SecretString::from(password.into())),
            port: 22,
        }
    }

    /// Key credentials on the default port.
    pub fn private_key(username: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            username: username.into(),
            auth: AuthMethod::PrivateKey { path: path.into() },
            port: 22,
        }
    }

    /// Set the default port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Options for the local `ssh` client.
#[derive(Debug, Clone)]
pub struct SshClientConfig {
    /// Client executable.
    pub program: String,

    /// Credential helper used for password auth (`sshpass`). `None`
    /// disables password auth.
    pub password_helper: Option<String>,

    /// TCP connect timeout.
    pub connect_timeout: Duration,

    /// Keepalive probe interval.
    pub server_alive_interval: Duration,

    /// Unanswered keepalives before the client gives up.
    pub server_alive_count_max: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SshClientConfig {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            password_helper: Some("sshpass".to_string()),
            connect_timeout: Duration::from_secs(30),
            server_alive_interval: Duration::from_secs(10),
            server_alive_count_max: 3,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}
