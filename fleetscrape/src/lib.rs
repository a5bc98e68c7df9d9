//! # Fleetscrape
//!
//! Async command collection for fleets of Cisco network devices.
//!
//! Fleetscrape runs an ordered batch of CLI commands against many devices at
//! once, one interactive session per device, and returns the cleaned output
//! of every command. Sessions are carried by the local `ssh` client.
//!
//! ## Features
//!
//! - Bounded worker pool with streamed, per-device results
//! - IOS-XR, IOS-XE and L2 switch dialects, selected per device
//! - Marker-delimited transcripts cut into per-command output
//! - Prompt-driven pacing for CLIs that cannot take a whole script at once
//! - Optional raw transcript capture for postmortems
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleetscrape::{CollectorBuilder, CommandBatch, CommandCatalog, DeviceProfile, OsFamily};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fleetscrape::Error> {
//!     let collector = CollectorBuilder::new()
//!         .username("netops")
//!         .password("secret")
//!         .workers(10)
//!         .build()?;
//!
//!     let catalog = CommandCatalog::new(CommandBatch::new(["show version", "show clock"]))?;
//!     let devices = vec![
//!         DeviceProfile::new("core-rtr01", "10.0.0.1", OsFamily::IosXr),
//!         DeviceProfile::new("edge-rtr01", "10.0.0.2", OsFamily::IosXe),
//!     ];
//!
//!     let mut run = collector.run(devices, &catalog);
//!     while let Some(result) = run.next().await {
//!         for command in &result.results {
//!             println!("{} | {}\n{}", result.device.hostname, command.command, command);
//!         }
//!     }
//!     println!("{}", run.summary());
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod command;
pub mod device;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod pool;
pub mod transcript;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use command::{CommandBatch, CommandCatalog};
pub use device::{DeviceProfile, OsFamily};
pub use dialect::{DialectDefinition, DialectRegistry};
pub use driver::{DeviceResult, DeviceSessionDriver, ExecutionResult};
pub use error::{CommandError, Error};
pub use pool::{
    Collector, CollectorBuilder, CommandFailurePolicy, RunHandle, RunSettings, RunSummary,
    TranscriptCapture,
};
pub use transport::{AuthMethod, Credentials, SshClientConfig, SshClientTransport, Transport};
