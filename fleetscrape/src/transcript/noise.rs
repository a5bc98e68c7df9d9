//! Line-level noise filtering for demultiplexed segments.
//!
//! A segment taken from between two markers still carries session chatter:
//! the echoed command, prompts, marker and paging echoes, client warnings,
//! banner text. The filter drops those lines by an ordered rule list and
//! leaves everything else untouched. It is pure and idempotent: cleaning an
//! already clean segment returns it unchanged.

use std::sync::LazyLock;

use crate::channel::escape;
use crate::command::SessionMarker;
use crate::device::OsFamily;
use crate::dialect::{DialectDefinition, DialectRegistry};

/// Why a line is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseRule {
    /// Warnings and notices printed by the local ssh client.
    ClientChatter,
    /// A line carrying a marker token.
    MarkerEcho,
    /// Echo of a paging directive.
    PagingEcho,
    /// A prompt with nothing after it.
    BarePrompt,
    /// Echo of the command that produced the segment.
    EchoedCommand,
    /// Echo of the session-terminating command.
    SessionExit,
    /// Known banner or license text for the dialect.
    Banner,
}

impl NoiseRule {
    /// Rules in evaluation order.
    pub const ALL: [NoiseRule; 7] = [
        NoiseRule::ClientChatter,
        NoiseRule::MarkerEcho,
        NoiseRule::PagingEcho,
        NoiseRule::BarePrompt,
        NoiseRule::EchoedCommand,
        NoiseRule::SessionExit,
        NoiseRule::Banner,
    ];
}

/// Noise filter bound to one dialect.
#[derive(Debug, Clone, Copy)]
pub struct NoiseFilter<'a> {
    dialect: &'a DialectDefinition,
}

impl<'a> NoiseFilter<'a> {
    /// Create a filter for `dialect`.
    pub fn new(dialect: &'a DialectDefinition) -> Self {
        Self { dialect }
    }

    /// First rule that drops `line`, if any.
    ///
    /// `command` is the command whose segment the line came from; without it
    /// echoed commands cannot be recognized.
    pub fn classify(&self, line: &str, command: Option<&str>) -> Option<NoiseRule> {
        NoiseRule::ALL
            .into_iter()
            .find(|rule| self.matches(*rule, line, command))
    }

    /// Whether `line` survives filtering.
    pub fn keeps(&self, line: &str, command: Option<&str>) -> bool {
        self.classify(line, command).is_none()
    }

    /// Clean one segment.
    ///
    /// Strips escape sequences and carriage returns, drops noise lines,
    /// trims trailing whitespace from kept lines and removes leading and
    /// trailing blank lines.
    ///
    /// A device that prints its prompt on a line of its own echoes the
    /// command without a prompt in front. That bare echo is only dropped when
    /// it directly follows a dropped prompt or marker line and no output has
    /// been kept yet, so output lines that happen to equal the command stay.
    pub fn clean(&self, segment: &str, command: Option<&str>) -> String {
        let stripped = escape::strip_str(segment.as_bytes()).replace('\r', "");

        let mut kept: Vec<&str> = Vec::new();
        let mut echo_pending = false;
        let mut echo_seen = false;
        for line in stripped.lines() {
            if line.trim().is_empty() {
                kept.push("");
                continue;
            }
            match self.classify(line, command) {
                Some(NoiseRule::BarePrompt | NoiseRule::MarkerEcho) => {
                    echo_pending = !echo_seen && kept.iter().all(|line| line.is_empty());
                }
                Some(NoiseRule::EchoedCommand) => {
                    echo_seen = true;
                    echo_pending = false;
                }
                Some(_) => {}
                None if echo_pending && is_bare_echo(line, command) => {
                    echo_seen = true;
                    echo_pending = false;
                }
                None => {
                    echo_pending = false;
                    kept.push(line.trim_end());
                }
            }
        }

        let first = kept.iter().position(|line| !line.is_empty());
        let last = kept.iter().rposition(|line| !line.is_empty());
        match (first, last) {
            (Some(first), Some(last)) => kept[first..=last].join("\n"),
            _ => String::new(),
        }
    }

    fn matches(&self, rule: NoiseRule, line: &str, command: Option<&str>) -> bool {
        let trimmed = line.trim();
        match rule {
            NoiseRule::ClientChatter => is_client_chatter(trimmed),
            NoiseRule::MarkerEcho => SessionMarker::is_marker_text(trimmed),
            NoiseRule::PagingEcho => {
                let input = self.input_text(trimmed);
                self.dialect
                    .paging_directives
                    .iter()
                    .any(|directive| input == directive)
            }
            NoiseRule::BarePrompt => self.dialect.prompt.is_bare_prompt(trimmed),
            NoiseRule::EchoedCommand => match command {
                Some(command) => {
                    let command = command.trim();
                    !command.is_empty() && self.prompted_input(trimmed) == Some(command)
                }
                None => false,
            },
            NoiseRule::SessionExit => {
                self.prompted_input(trimmed) == Some(self.dialect.terminate_command.as_str())
            }
            NoiseRule::Banner => self
                .dialect
                .banner_fragments
                .iter()
                .any(|fragment| trimmed.contains(fragment.as_str())),
        }
    }

    /// Input typed after a prompt, if the line starts with one.
    fn prompted_input<'l>(&self, line: &'l str) -> Option<&'l str> {
        self.dialect.prompt.strip_prompt(line).map(str::trim)
    }

    /// Line text with a leading prompt removed.
    fn input_text<'l>(&self, line: &'l str) -> &'l str {
        self.dialect
            .prompt
            .strip_prompt(line)
            .map_or(line, str::trim)
    }
}

fn is_bare_echo(line: &str, command: Option<&str>) -> bool {
    command.is_some_and(|command| !command.trim().is_empty() && line.trim() == command.trim())
}

fn is_client_chatter(line: &str) -> bool {
    line.contains("Pseudo-terminal will not be allocated")
        || (line.starts_with("Warning:") && line.contains("known hosts"))
        || (line.starts_with("Connection to ") && line.ends_with("closed."))
}

static BUILTIN: LazyLock<DialectRegistry> = LazyLock::new(DialectRegistry::builtin);

/// Whether `line` survives the built-in filter for `family`.
///
/// Command echoes are not considered since no command is known.
pub fn keep_line(line: &str, family: OsFamily) -> bool {
    NoiseFilter::new(BUILTIN.get(family)).keeps(line, None)
}
