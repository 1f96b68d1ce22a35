//! Command planners: pure functions from configuration plus a branches
//! snapshot to a program of opcodes. Planners never touch the repository.

pub mod append;
pub mod hack;
pub mod kill;
pub mod prepend;
pub mod propose;
pub mod rename;
pub mod ship;
pub mod sync;
pub mod wrap;

use crate::config::full::FullConfig;
use crate::core::branch::LocalBranchName;
use crate::core::branches::{BranchesSnapshot, SyncStatus};
use crate::errors::{Error, Result};

/// Snapshot-time facts every planner works from.
#[derive(Debug, Clone)]
pub struct PlanContext<'a> {
    pub config: &'a FullConfig,
    pub snapshot: &'a BranchesSnapshot,
    pub previous_branch: Option<LocalBranchName>,
    pub has_open_changes: bool,
    pub has_origin: bool,
    pub has_upstream: bool,
    pub dry_run: bool,
}

impl<'a> PlanContext<'a> {
    pub fn active(&self) -> &LocalBranchName {
        &self.snapshot.active
    }
}

/// Shared validation for commands that create a branch.
pub fn ensure_creatable(ctx: &PlanContext, target: &LocalBranchName) -> Result<()> {
    if ctx.snapshot.has_local_branch(target) {
        return Err(Error::user_misuse(format!(
            "there is already a branch named {target}"
        )));
    }
    if ctx.snapshot.has_matching_tracking_branch_for(target) {
        return Err(Error::user_misuse(format!(
            "a branch named {target} already exists at the remote"
        )));
    }
    Ok(())
}

/// Look up a branch that a command wants to operate on.
pub fn require_branch<'s>(
    ctx: &'s PlanContext,
    name: &LocalBranchName,
) -> Result<&'s crate::core::branches::BranchInfo> {
    let info = ctx
        .snapshot
        .find_by_local_name(name)
        .ok_or_else(|| Error::user_misuse(format!("there is no branch named {name}")))?;
    if info.sync_status == SyncStatus::OtherWorktree {
        return Err(Error::user_misuse(format!(
            "branch {name} is checked out in another worktree"
        )));
    }
    Ok(info)
}
