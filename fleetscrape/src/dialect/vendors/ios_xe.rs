//! Cisco IOS / IOS-XE dialect.
//!
//! IOS-XE accepts the whole script on stdin once a pseudo-terminal is
//! forced, processing lines in order. Markers go out as `echo` lines: with
//! the IOS.sh shell disabled the device answers with a multi-line hint
//! instead of echoing, but the terminal echo of the input line still puts
//! the token into the transcript. The hint text is filtered as banner noise.

use crate::device::OsFamily;
use crate::dialect::{DialectDefinition, MarkerStyle, SessionMode};

/// Dialect name for IOS-XE.
pub const DIALECT_NAME: &str = "cisco_iosxe";

/// Fragments of the IOS.sh "shell is disabled" hint.
pub(crate) const IOS_SH_HINT: &[&str] = &[
    "IOS.sh",
    "shell is currently disabled",
    "term shell",
    "shell processing full",
    "man command",
    "The command you have entered",
    "You can enable",
    "You can also enable",
    "For more information",
    "However, the shell",
    "There is additional information",
];

/// Create the IOS-XE dialect.
pub fn dialect() -> DialectDefinition {
    let dialect = DialectDefinition::new(DIALECT_NAME, OsFamily::IosXe)
        .with_session_mode(SessionMode::SingleWrite)
        .with_pty(true)
        .with_prompt(r"[\w.\-]{1,63}(?:\([\w.\-]{1,63}\))?[#>]")
        .unwrap()
        .with_paging_directive("terminal length 0")
        .with_paging_directive("terminal width 512")
        .with_marker_style(MarkerStyle::Echo)
        .with_terminate_command("exit")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Unknown command");

    IOS_SH_HINT
        .iter()
        .fold(dialect, |dialect, fragment| dialect.with_banner(*fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ios_xe_dialect() {
        let dialect = dialect();
        assert_eq!(dialect.name, "cisco_iosxe");
        assert_eq!(dialect.family, OsFamily::IosXe);
        assert_eq!(dialect.session_mode, SessionMode::SingleWrite);
        assert!(dialect.force_pty);
        assert_eq!(dialect.marker_line("@@T@@"), "echo @@T@@");
        assert_eq!(dialect.banner_fragments.len(), IOS_SH_HINT.len());
    }

    #[test]
    fn test_prompt_match() {
        let dialect = dialect();
        assert!(dialect.prompt.is_bare_prompt("R1#"));
        assert!(dialect.prompt.is_bare_prompt("edge-rtr.lab>"));
        assert!(!dialect.prompt.is_bare_prompt("R1#show version"));
        assert_eq!(dialect.prompt.strip_prompt("R1#show version"), Some("show version"));
    }
}
