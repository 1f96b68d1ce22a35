//! Planner for `grove rename-branch`: recreate a branch under a new name at
//! the same SHA and migrate tracking branch and lineage.

use crate::core::branch::LocalBranchName;
use crate::core::branches::{BranchType, SyncStatus};
use crate::errors::{Error, Result};
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::{ensure_creatable, require_branch, PlanContext};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

pub fn plan(
    ctx: &PlanContext,
    old: &LocalBranchName,
    new: &LocalBranchName,
    force: bool,
) -> Result<Program> {
    if old == new {
        return Err(Error::user_misuse(format!(
            "branch {old} already has that name"
        )));
    }
    let info = require_branch(ctx, old)?;
    match ctx.config.branch_type(old) {
        BranchType::Main => {
            return Err(Error::user_misuse("the main branch cannot be renamed"));
        }
        BranchType::Perennial if !force => {
            return Err(Error::user_misuse(format!(
                "{old} is a perennial branch; use --force to rename it"
            )));
        }
        _ => {}
    }
    if info.sync_status == SyncStatus::NotInSync {
        return Err(Error::user_misuse(format!(
            "branch {old} is not in sync with its tracking branch; sync it before renaming"
        )));
    }
    ensure_creatable(ctx, new)?;

    let mut program = Program::new();
    program.append(Opcode::CreateBranch {
        branch: new.clone(),
        starting_point: old.to_string(),
    });
    if ctx.active() == old {
        program.append(Opcode::Checkout {
            branch: new.clone(),
        });
    }
    if let Some(parent) = ctx.config.lineage.parent(old) {
        program.append(Opcode::SetParent {
            child: new.clone(),
            parent: parent.clone(),
        });
    }
    for child in ctx.config.lineage.children(old) {
        program.append(Opcode::ChangeParent {
            branch: child,
            parent: new.clone(),
        });
    }
    program.append(Opcode::DeleteParentBranch {
        branch: old.clone(),
    });
    if info.has_tracking_branch() && ctx.config.is_online() {
        program.append(Opcode::CreateTrackingBranch {
            branch: new.clone(),
        });
        if let Some(remote) = &info.remote_name {
            program.append(Opcode::DeleteTrackingBranch {
                branch: remote.clone(),
            });
        }
    }
    program.append(Opcode::ForceDeleteLocalBranch {
        branch: old.clone(),
    });
    let mut candidates = Vec::new();
    if let Some(previous) = &ctx.previous_branch {
        candidates.push(previous.clone());
    }
    wrap(
        &mut program,
        WrapOptions {
            stash_open_changes: false,
            previous_branch_candidates: candidates,
        },
    );
    Ok(program)
}
