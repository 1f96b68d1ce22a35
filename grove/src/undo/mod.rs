//! Undo synthesis: diff begin/end snapshots into programs that walk the
//! repository and its configuration back to the pre-command state.

pub mod branch_diff;
pub mod config_diff;
