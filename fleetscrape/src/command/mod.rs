//! Command batches and the per-device input script.
//!
//! A batch is the ordered list of CLI commands for one device. The script
//! composer wraps each command in a marker pair so that one session can carry
//! the whole batch and the transcript can be split back apart afterwards.

mod batch;
mod marker;
pub mod script;

pub use batch::{CommandBatch, CommandCatalog};
pub use marker::{MARKER_PREFIX, SessionMarker};
pub use script::{ComposedScript, ScriptStep, compose};
