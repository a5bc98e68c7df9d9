//! Prompt pattern compilation.
//!
//! A dialect supplies one unanchored prompt expression (e.g.
//! `[\w.\-]{1,63}[#>]`). Three anchored variants are derived from it: a
//! whole-line match for bare prompt lines, a line-start match for prompts
//! followed by echoed input, and a buffer-end match used to detect that the
//! device is waiting for input again.

use regex::Regex;

use super::escape;

/// Prompt shape shared by most Cisco CLIs: `hostname#` or `hostname>`, with an
/// optional `(config...)` mode suffix.
pub const GENERIC_PROMPT: &str = r"[\w.\-]{1,63}(?:\([\w.\-]{1,63}\))?[#>]";

/// Compiled prompt patterns for one dialect.
#[derive(Debug, Clone)]
pub struct PromptPatterns {
    /// A line consisting only of a prompt.
    bare: Regex,

    /// A prompt at the start of a line.
    leading: Regex,

    /// A prompt at the very end of captured output.
    trailing: regex::bytes::Regex,
}

impl PromptPatterns {
    /// Compile the anchored variants of `pattern`.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            bare: Regex::new(&format!(r"^\s*(?:{pattern})\s*$"))?,
            leading: Regex::new(&format!(r"^\s*(?:{pattern})"))?,
            trailing: trailing_pattern(pattern)?,
        })
    }

    /// Patterns for [`GENERIC_PROMPT`].
    pub fn generic() -> Self {
        Self::new(GENERIC_PROMPT).expect("generic prompt pattern is valid")
    }

    /// Whether `line` is nothing but a prompt.
    pub fn is_bare_prompt(&self, line: &str) -> bool {
        self.bare.is_match(line)
    }

    /// Text following a leading prompt, or `None` if the line does not start
    /// with one.
    pub fn strip_prompt<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.leading.find(line).map(|m| &line[m.end()..])
    }

    /// Whether captured output ends with a prompt.
    ///
    /// Escape sequences are stripped first; devices often colorize or
    /// reposition around the prompt.
    pub fn ends_with_prompt(&self, data: &[u8]) -> bool {
        let cleaned = escape::strip(data);
        self.trailing.is_match(&cleaned)
    }
}

/// Compile a prompt expression anchored to the end of the buffer.
///
/// The prompt must start a line (or the searched region) and may only be
/// followed by whitespace.
fn trailing_pattern(pattern: &str) -> Result<regex::bytes::Regex, regex::Error> {
    regex::bytes::Regex::new(&format!(r"(?:^|\n)[ \t\r]*(?:{pattern})[ \t]*$"))
}
