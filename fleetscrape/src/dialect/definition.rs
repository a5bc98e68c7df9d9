//! Dialect definition: everything the pipeline needs to know about one OS family.

use std::time::Duration;

use indexmap::IndexMap;

use crate::channel::PromptPatterns;
use crate::device::OsFamily;

/// How the command script is delivered to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Start a shell, then write one line at a time and wait for the prompt
    /// to come back before the next write.
    Paced,

    /// Write the whole script at once and close input.
    SingleWrite,
}

/// How a marker token is rendered as an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// `echo <token>`
    Echo,

    /// `!<token>`, a CLI comment line that is echoed but not executed.
    Comment,
}

impl MarkerStyle {
    /// Input line carrying `token`.
    pub fn render(&self, token: &str) -> String {
        match self {
            MarkerStyle::Echo => format!("echo {token}"),
            MarkerStyle::Comment => format!("!{token}"),
        }
    }
}

/// Upper bounds for paced prompt waits.
#[derive(Debug, Clone)]
pub struct SettlePolicy {
    /// Wait for the login banner and first prompt.
    pub banner: Duration,

    /// Wait after paging directives and marker lines.
    pub directive: Duration,

    /// Wait after a command with no specific rule.
    pub command: Duration,

    /// Per-command overrides keyed by command prefix. First match wins.
    pub rules: IndexMap<String, Duration>,
}

impl SettlePolicy {
    /// Settle bound for `command`.
    pub fn for_command(&self, command: &str) -> Duration {
        self.rules
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, wait)| *wait)
            .unwrap_or(self.command)
    }

    /// Add a prefix rule.
    pub fn with_rule(mut self, prefix: impl Into<String>, wait: Duration) -> Self {
        self.rules.insert(prefix.into(), wait);
        self
    }
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            banner: Duration::from_secs(3),
            directive: Duration::from_secs(1),
            command: Duration::from_secs(2),
            rules: IndexMap::new(),
        }
        .with_rule("ping", Duration::from_secs(8))
        .with_rule("traceroute", Duration::from_secs(15))
        .with_rule("show vrf", Duration::from_secs(3))
    }
}

/// Dialect definition containing all family-specific behavior.
///
/// One value is selected per device and threaded through the script
/// composer, the session driver and the noise filter.
#[derive(Debug, Clone)]
pub struct DialectDefinition {
    /// Dialect name (e.g., "cisco_iosxr").
    pub name: String,

    /// Family this dialect serves.
    pub family: OsFamily,

    /// Script delivery mode.
    pub session_mode: SessionMode,

    /// Whether the client must force pseudo-terminal allocation.
    pub force_pty: bool,

    /// Directives that disable output paging, sent before any command.
    pub paging_directives: Vec<String>,

    /// How marker tokens are written to the device.
    pub marker_style: MarkerStyle,

    /// Command that ends the session.
    pub terminate_command: String,

    /// Compiled prompt patterns.
    pub prompt: PromptPatterns,

    /// Substrings identifying banner, license and shell-hint lines.
    pub banner_fragments: Vec<String>,

    /// Substrings that mark a command as failed.
    pub failed_when_contains: Vec<String>,

    /// Paced-mode wait bounds.
    pub settle: SettlePolicy,
}

impl DialectDefinition {
    /// Create a dialect with a generic `name#`/`name>` prompt.
    pub fn new(name: impl Into<String>, family: OsFamily) -> Self {
        Self {
            name: name.into(),
            family,
            session_mode: SessionMode::SingleWrite,
            force_pty: false,
            paging_directives: vec![],
            marker_style: MarkerStyle::Echo,
            terminate_command: "exit".to_string(),
            prompt: PromptPatterns::generic(),
            banner_fragments: vec![],
            failed_when_contains: vec![],
            settle: SettlePolicy::default(),
        }
    }

    /// Set the delivery mode.
    pub fn with_session_mode(mut self, mode: SessionMode) -> Self {
        self.session_mode = mode;
        self
    }

    /// Require pseudo-terminal allocation.
    pub fn with_pty(mut self, force: bool) -> Self {
        self.force_pty = force;
        self
    }

    /// Set the prompt pattern (unanchored; anchors are added per use).
    pub fn with_prompt(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.prompt = PromptPatterns::new(pattern)?;
        Ok(self)
    }

    /// Add a paging directive.
    pub fn with_paging_directive(mut self, directive: impl Into<String>) -> Self {
        self.paging_directives.push(directive.into());
        self
    }

    /// Set the marker style.
    pub fn with_marker_style(mut self, style: MarkerStyle) -> Self {
        self.marker_style = style;
        self
    }

    /// Set the terminating command.
    pub fn with_terminate_command(mut self, command: impl Into<String>) -> Self {
        self.terminate_command = command.into();
        self
    }

    /// Add a banner fragment.
    pub fn with_banner(mut self, fragment: impl Into<String>) -> Self {
        self.banner_fragments.push(fragment.into());
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Set the settle policy.
    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// First failure pattern contained in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Input line for a marker token.
    pub fn marker_line(&self, token: &str) -> String {
        self.marker_style.render(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_rules() {
        let settle = SettlePolicy::default();
        assert_eq!(settle.for_command("ping 10.0.0.1 repeat 5"), Duration::from_secs(8));
        assert_eq!(settle.for_command("show vrf all"), Duration::from_secs(3));
        assert_eq!(settle.for_command("show version"), Duration::from_secs(2));
        assert!(settle.for_command("ping 1.1.1.1") > settle.for_command("show clock"));
    }

    #[test]
    fn test_marker_styles() {
        assert_eq!(MarkerStyle::Echo.render("@@X@@"), "echo @@X@@");
        assert_eq!(MarkerStyle::Comment.render("@@X@@"), "!@@X@@");
    }

    #[test]
    fn test_detect_failure() {
        let dialect = DialectDefinition::new("test", OsFamily::IosXe)
            .with_failure_pattern("% Invalid input")
            .with_failure_pattern("% Incomplete command");
        assert_eq!(
            dialect.detect_failure("        ^\n% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(dialect.detect_failure("R1 uptime is 2 weeks"), None);
    }

    #[test]
    fn test_builder_defaults() {
        let dialect = DialectDefinition::new("test", OsFamily::L2Switch);
        assert_eq!(dialect.session_mode, SessionMode::SingleWrite);
        assert_eq!(dialect.terminate_command, "exit");
        assert!(!dialect.force_pty);
        assert!(dialect.prompt.is_bare_prompt("switch#"));
    }
}
