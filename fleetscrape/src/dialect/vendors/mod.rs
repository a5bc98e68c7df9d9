//! Built-in dialect definitions.

pub mod ios_xe;
pub mod ios_xr;
pub mod l2_switch;
