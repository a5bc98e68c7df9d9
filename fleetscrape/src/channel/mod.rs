//! Channel layer: transcript buffering, prompt detection and escape stripping.

mod buffer;
pub mod escape;
mod patterns;

pub use buffer::TranscriptBuffer;
pub use patterns::{GENERIC_PROMPT, PromptPatterns};
