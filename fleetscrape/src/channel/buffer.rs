//! Transcript buffer with tail-limited prompt search.
//!
//! The buffer keeps every byte the client produced, untouched, so the
//! transcript can later be demultiplexed and dumped for postmortems. Prompt
//! detection only looks at the last `search_depth` bytes written since a
//! given mark, which keeps it cheap for large outputs such as full routing
//! tables.

use super::patterns::PromptPatterns;

/// Accumulated session output.
#[derive(Debug)]
pub struct TranscriptBuffer {
    /// Raw captured bytes.
    buffer: Vec<u8>,

    /// How many bytes from the end to search for prompts.
    search_depth: usize,
}

impl TranscriptBuffer {
    /// Create a buffer with the specified prompt search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append raw output.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Current length, used as a mark before writing to the device.
    pub fn mark(&self) -> usize {
        self.buffer.len()
    }

    /// Whether output written after `since` ends with a prompt.
    ///
    /// Only the last `search_depth` bytes are examined.
    pub fn prompt_since(&self, prompt: &PromptPatterns, since: usize) -> bool {
        let tail_start = self.buffer.len().saturating_sub(self.search_depth);
        let start = since.max(tail_start).min(self.buffer.len());
        let region = &self.buffer[start..];
        !region.is_empty() && prompt.ends_with_prompt(region)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

}
