//! Catalyst-class layer 2 switch dialect.
//!
//! Same CLI behavior as IOS-XE routers. Kept as its own dialect because
//! switches get their own command batch and tend to run older IOS trains
//! where `show` commands over large MAC tables need longer settle bounds.

use std::time::Duration;

use super::ios_xe::IOS_SH_HINT;
use crate::device::OsFamily;
use crate::dialect::{DialectDefinition, MarkerStyle, SessionMode, SettlePolicy};

/// Dialect name for L2 switches.
pub const DIALECT_NAME: &str = "cisco_l2_switch";

/// Create the L2 switch dialect.
pub fn dialect() -> DialectDefinition {
    let settle = SettlePolicy::default()
        .with_rule("show mac address-table", Duration::from_secs(5))
        .with_rule("show spanning-tree", Duration::from_secs(4));

    let dialect = DialectDefinition::new(DIALECT_NAME, OsFamily::L2Switch)
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
        .with_settle(settle);

    IOS_SH_HINT
        .iter()
        .fold(dialect, |dialect, fragment| dialect.with_banner(*fragment))
}
