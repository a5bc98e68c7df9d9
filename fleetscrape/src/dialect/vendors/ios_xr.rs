//! Cisco IOS-XR dialect.
//!
//! IOS-XR has no single-round-trip exec mode that survives piped input: the
//! CLI closes a stdin-fed session before reading it. Sessions therefore run
//! paced through an interactive shell with a forced pseudo-terminal, and
//! marker tokens are sent as `!` comment lines since there is no `echo`.
//!
//! # Prompt Examples
//!
//! ```text
//! RP/0/RSP0/CPU0:pe1#          # ASR9k
//! RP/0/RP0/CPU0:xrv9k#         # NCS / XRv
//! xr1#                         # prompt without node prefix
//! ```

use crate::device::OsFamily;
use crate::dialect::{DialectDefinition, MarkerStyle, SessionMode, SettlePolicy};

/// Dialect name for IOS-XR.
pub const DIALECT_NAME: &str = "cisco_iosxr";

/// Create the IOS-XR dialect.
pub fn dialect() -> DialectDefinition {
    DialectDefinition::new(DIALECT_NAME, OsFamily::IosXr)
        .with_session_mode(SessionMode::Paced)
        .with_pty(true)
        .with_prompt(r"(?:RP/\d+/(?:RSP|RP)?\d+/CPU\d+:)?[\w.\-]{1,63}(?:\([\w.\-]{1,63}\))?[#>]")
        .unwrap()
        .with_paging_directive("terminal length 0")
        .with_paging_directive("terminal width 512")
        .with_marker_style(MarkerStyle::Comment)
        .with_terminate_command("exit")
        // XRv evaluation license banner
        .with_banner("READ CAREFULLY")
        .with_banner("Demo Version")
        .with_banner("End User License")
        .with_banner("License Agreement")
        .with_banner("cisco.com/go/terms")
        .with_banner("demonstration and evaluation")
        .with_banner("non-production environment")
        .with_banner("Downloading, installing")
        .with_banner("binding yourself")
        .with_banner("unwilling to license")
        .with_banner("return the Software")
        .with_banner("Please login with any configured user/password")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% This command is not authorized")
        .with_settle(SettlePolicy::default())
}
