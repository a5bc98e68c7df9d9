//! Local client process construction.
//!
//! Sessions are carried by an external client process rather than an
//! in-process protocol stack. A [`Transport`] only decides *which* process
//! to start for a target; spawning, piping, and killing it are the session
//! driver's job.

use std::process::Stdio;

use secrecy::ExposeSecret;
use tokio::process::Command;

use super::config::{AuthMethod, Credentials, HostKeyVerification, SshClientConfig};
use crate::error::TransportError;

/// Everything a transport needs to know about one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionTarget<'a> {
    /// Hostname used for logging and transcripts.
    pub hostname: &'a str,

    /// Address to connect to.
    pub address: &'a str,

    /// Port to connect to.
    pub port: u16,

    /// Run-wide credentials.
    pub credentials: &'a Credentials,

    /// Force pseudo-terminal allocation.
    pub force_pty: bool,
}

/// Builds the client process for a session.
pub trait Transport: Send + Sync + 'static {
    /// Command that opens an interactive session to `target`.
    ///
    /// Standard streams are configured by the caller.
    fn command(&self, target: &SessionTarget<'_>) -> Result<Command, TransportError>;
}

/// Transport that shells out to OpenSSH.
///
/// Password auth goes through `sshpass -e`, which reads the password from
/// the `SSHPASS` environment variable so it never appears in the process
/// argument list.
#[derive(Debug, Clone, Default)]
pub struct SshClientTransport {
    config: SshClientConfig,
}

impl SshClientTransport {
    /// Create a transport with the given client options.
    pub fn new(config: SshClientConfig) -> Self {
        Self { config }
    }

    /// Client options.
    pub fn config(&self) -> &SshClientConfig {
        &self.config
    }

    fn ssh_args(&self, target: &SessionTarget<'_>) -> Vec<String> {
        let config = &self.config;
        let mut args = Vec::new();

        push_option(
            &mut args,
            format!(
                "StrictHostKeyChecking={}",
                config.host_key_verification.as_option_value()
            ),
        );
        match (&config.host_key_verification, &config.known_hosts_path) {
            (HostKeyVerification::Disabled, _) => {
                push_option(&mut args, "UserKnownHostsFile=/dev/null".to_string());
            }
            (_, Some(path)) => {
                push_option(&mut args, format!("UserKnownHostsFile={}", path.display()));
            }
            (_, None) => {}
        }
        push_option(
            &mut args,
            format!("ConnectTimeout={}", config.connect_timeout.as_secs().max(1)),
        );
        push_option(
            &mut args,
            format!(
                "ServerAliveInterval={}",
                config.server_alive_interval.as_secs().max(1)
            ),
        );
        push_option(
            &mut args,
            format!("ServerAliveCountMax={}", config.server_alive_count_max),
        );
        push_option(&mut args, "LogLevel=ERROR".to_string());

        match &target.credentials.auth {
            AuthMethod::Password(_) => {
                push_option(
                    &mut args,
                    "PreferredAuthentications=password,keyboard-interactive".to_string(),
                );
                push_option(&mut args, "PubkeyAuthentication=no".to_string());
            }
            AuthMethod::PrivateKey { path } => {
                push_option(&mut args, "IdentitiesOnly=yes".to_string());
                push_option(&mut args, "BatchMode=yes".to_string());
                args.push("-i".to_string());
                args.push(path.display().to_string());
            }
            AuthMethod::None => push_option(&mut args, "BatchMode=yes".to_string()),
        }

        args.push("-p".to_string());
        args.push(target.port.to_string());
        if target.force_pty {
            args.push("-tt".to_string());
        }
        args.push(format!("{}@{}", target.credentials.username, target.address));
        args
    }
}

fn push_option(args: &mut Vec<String>, value: String) {
    args.push("-o".to_string());
    args.push(value);
}

impl Transport for SshClientTransport {
    fn command(&self, target: &SessionTarget<'_>) -> Result<Command, TransportError> {
        let args = self.ssh_args(target);

        let mut command = match &target.credentials.auth {
            AuthMethod::Password(password) => {
                let helper = self
                    .config
                    .password_helper
                    .as_deref()
                    .ok_or(TransportError::MissingPasswordHelper)?;
                let mut command = Command::new(helper);
                command
                    .arg("-e")
                    .arg(&self.config.program)
                    .args(&args)
                    .env("SSHPASS", password.expose_secret());
                command
            }
            AuthMethod::PrivateKey { .. } | AuthMethod::None => {
                let mut command = Command::new(&self.config.program);
                command.args(&args);
                command
            }
        };

        command.stdin(Stdio::piped());
        Ok(command)
    }
}
