//! Per-device session driving.
//!
//! [`DeviceSessionDriver`] opens one session per device, runs the device's
//! whole command batch through it, and turns the captured transcript into a
//! [`DeviceResult`] with one [`ExecutionResult`] per command.

mod registry;
mod result;
mod session;

pub use registry::{SessionLease, SessionRegistry};
pub use result::{DeviceResult, ExecutionResult, NO_OUTPUT_SENTINEL};
pub use session::DeviceSessionDriver;
