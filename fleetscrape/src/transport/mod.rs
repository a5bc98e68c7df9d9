//! Transport layer: the local client process that carries a session.

pub mod config;
mod process;

pub use config::{AuthMethod, Credentials, HostKeyVerification, SshClientConfig};
pub use process::{SessionTarget, SshClientTransport, Transport};
