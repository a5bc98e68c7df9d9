//! Device dialects.
//!
//! A dialect is the capability set for one OS family: how paging is
//! disabled, how markers are written, whether the session is paced through
//! an interactive shell or delivered in one write, what the prompt looks
//! like, and which lines are noise. It is picked once per device and passed
//! through every pipeline stage.

mod definition;
mod registry;
pub mod vendors;

pub use definition::{DialectDefinition, MarkerStyle, SessionMode, SettlePolicy};
pub use registry::DialectRegistry;
