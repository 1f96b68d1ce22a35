//! Planner for `grove kill`: remove an obsolete branch locally and, for
//! branch types we own, at the remote.

use crate::core::branch::LocalBranchName;
use crate::core::branches::{BranchInfo, BranchType};
use crate::errors::{Error, Result};
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::{require_branch, PlanContext};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// The run program plus the final undo program that restores committed
/// open changes as uncommitted ones.
pub struct KillPlan {
    pub program: Program,
    pub final_undo_program: Program,
}

pub fn plan(ctx: &PlanContext, branch: Option<LocalBranchName>) -> Result<KillPlan> {
    let name = branch.unwrap_or_else(|| ctx.active().clone());
    let info = require_branch(ctx, &name)?;
    let branch_type = ctx.config.branch_type(&name);
    match branch_type {
        BranchType::Main => {
            return Err(Error::user_misuse("cannot kill the main branch"));
        }
        BranchType::Perennial => {
            return Err(Error::user_misuse(format!(
                "cannot kill perennial branch {name}"
            )));
        }
        BranchType::Feature
        | BranchType::Parked
        | BranchType::Observed
        | BranchType::Contribution => {}
    }

    let killing_active = &name == ctx.active();
    let branch_when_done = if killing_active {
        ctx.previous_branch
            .clone()
            .filter(|previous| previous != &name && ctx.snapshot.has_local_branch(previous))
            .unwrap_or_else(|| ctx.config.main_branch.clone())
    } else {
        ctx.active().clone()
    };

    let mut program = Program::new();
    let mut final_undo_program = Program::new();

    // Observed and contribution branches belong to someone else: only the
    // local copy goes away.
    let delete_tracking = matches!(branch_type, BranchType::Feature | BranchType::Parked)
        && info.has_tracking_branch()
        && ctx.config.is_online();
    if delete_tracking {
        if let Some(remote) = &info.remote_name {
            program.append(Opcode::DeleteTrackingBranch {
                branch: remote.clone(),
            });
        }
    }
    kill_local(
        ctx,
        &mut program,
        &mut final_undo_program,
        &name,
        info,
        killing_active,
        &branch_when_done,
    );

    let mut candidates = Vec::new();
    if let Some(previous) = &ctx.previous_branch {
        candidates.push(previous.clone());
    }
    candidates.push(ctx.active().clone());
    wrap(
        &mut program,
        WrapOptions {
            stash_open_changes: !killing_active && ctx.has_open_changes,
            previous_branch_candidates: candidates,
        },
    );
    Ok(KillPlan {
        program,
        final_undo_program,
    })
}

fn kill_local(
    ctx: &PlanContext,
    program: &mut Program,
    final_undo_program: &mut Program,
    name: &LocalBranchName,
    _info: &BranchInfo,
    killing_active: bool,
    branch_when_done: &LocalBranchName,
) {
    if killing_active {
        if ctx.has_open_changes {
            program.append(Opcode::CommitOpenChanges);
            // Register the new tip as the branch's initial SHA so undo
            // recreates the branch including the just-committed changes.
            program.append(Opcode::UpdateInitialBranchLocalSHA {
                branch: name.clone(),
            });
            // Undo then lifts that commit so the changes come back
            // uncommitted.
            final_undo_program.append(Opcode::Checkout {
                branch: name.clone(),
            });
            final_undo_program.append(Opcode::UndoLastCommit);
        }
        program.append(Opcode::Checkout {
            branch: branch_when_done.clone(),
        });
    }
    program.append(Opcode::DeleteLocalBranch {
        branch: name.clone(),
    });
    if !ctx.dry_run {
        let parent = ctx
            .config
            .lineage
            .parent(name)
            .cloned()
            .unwrap_or_else(|| ctx.config.main_branch.clone());
        for child in ctx.config.lineage.children(name) {
            program.append(Opcode::ChangeParent {
                branch: child,
                parent: parent.clone(),
            });
        }
        program.append(Opcode::DeleteParentBranch {
            branch: name.clone(),
        });
    }
}
