//! Planner for `grove sync` and the per-branch sync sub-programs other
//! planners reuse.

use crate::config::values::{SyncFeatureStrategy, SyncPerennialStrategy};
use crate::core::branch::LocalBranchName;
use crate::core::branches::BranchType;
use crate::errors::Result;
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::{require_branch, PlanContext};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    /// Branches to sync; empty means the current branch.
    pub branches: Vec<LocalBranchName>,
    /// Sync every branch in the lineage.
    pub all: bool,
}

pub fn plan(ctx: &PlanContext, args: &SyncArgs) -> Result<Program> {
    let requested: Vec<LocalBranchName> = if args.all {
        let mut all = vec![ctx.config.main_branch.clone()];
        all.extend(ctx.config.lineage.order_hierarchically());
        all.dedup();
        all
    } else if args.branches.is_empty() {
        vec![ctx.active().clone()]
    } else {
        args.branches.clone()
    };

    // Branches the user named must exist; branches swept in via the
    // lineage (ancestors, --all) are skipped when they are gone or live in
    // another worktree.
    for branch in &args.branches {
        require_branch(ctx, branch)?;
    }

    // Ancestors must be current before their children absorb them.
    let mut to_sync: Vec<LocalBranchName> = Vec::new();
    for branch in &requested {
        for link in ctx.config.lineage.branch_and_ancestors(branch) {
            if !to_sync.contains(&link) {
                to_sync.push(link);
            }
        }
    }

    let mut program = Program::new();
    program.append(Opcode::Fetch);
    for branch in &to_sync {
        let Some(info) = ctx.snapshot.find_by_local_name(branch) else {
            continue;
        };
        if info.sync_status == crate::core::branches::SyncStatus::OtherWorktree
            && !args.branches.contains(branch)
        {
            continue;
        }
        // Parked branches only sync when the user names them.
        if ctx.config.branch_type(branch) == BranchType::Parked && !requested.contains(branch) {
            continue;
        }
        branch_sync_program(&mut program, ctx, branch, true)?;
    }
    if ctx.config.is_online() && ctx.has_origin {
        program.append(Opcode::PushTags);
    }
    program.append(Opcode::Checkout {
        branch: ctx.active().clone(),
    });

    let mut candidates = Vec::new();
    if let Some(previous) = &ctx.previous_branch {
        candidates.push(previous.clone());
    }
    wrap(
        &mut program,
        WrapOptions {
            stash_open_changes: ctx.has_open_changes,
            previous_branch_candidates: candidates,
        },
    );
    Ok(program)
}

/// Append the sync sub-program for one branch, ending with the branch
/// boundary marker that `grove skip` consumes.
pub fn branch_sync_program(
    program: &mut Program,
    ctx: &PlanContext,
    branch: &LocalBranchName,
    push_branch: bool,
) -> Result<()> {
    let info = require_branch(ctx, branch)?;
    let online = ctx.config.is_online();
    program.append(Opcode::Checkout {
        branch: branch.clone(),
    });
    match ctx.config.branch_type(branch) {
        BranchType::Feature | BranchType::Parked => {
            if let (true, Some(remote)) = (online && info.has_tracking_branch(), &info.remote_name)
            {
                match ctx.config.sync_feature_strategy {
                    SyncFeatureStrategy::Merge => program.append(Opcode::Merge {
                        branch: remote.to_string(),
                    }),
                    SyncFeatureStrategy::Rebase => program.append(Opcode::RebaseBranch {
                        branch: remote.to_string(),
                    }),
                }
            }
            for ancestor in ctx.config.lineage.ancestors(branch) {
                if ctx.snapshot.find_by_local_name(&ancestor).is_none() {
                    continue;
                }
                match ctx.config.sync_feature_strategy {
                    SyncFeatureStrategy::Merge => program.append(Opcode::MergeParent {
                        current: branch.clone(),
                        parent: ancestor,
                    }),
                    SyncFeatureStrategy::Rebase => program.append(Opcode::RebaseBranch {
                        branch: ancestor.to_string(),
                    }),
                }
            }
            if push_branch && online {
                if info.has_tracking_branch() {
                    program.append(Opcode::Push {
                        branch: branch.clone(),
                        force_if_includes: ctx.config.sync_feature_strategy
                            == SyncFeatureStrategy::Rebase,
                        no_push_hook: !ctx.config.push_hook,
                    });
                } else if ctx.config.push_new_branches && ctx.has_origin {
                    program.append(Opcode::CreateTrackingBranch {
                        branch: branch.clone(),
                    });
                }
            }
        }
        BranchType::Main | BranchType::Perennial => {
            if online && info.has_tracking_branch() {
                program.append(Opcode::PullCurrentBranch);
            }
            if online && ctx.config.sync_upstream && ctx.has_upstream {
                program.append(Opcode::FetchUpstream {
                    branch: branch.clone(),
                });
                let upstream_ref = format!("upstream/{branch}");
                match ctx.config.sync_perennial_strategy {
                    SyncPerennialStrategy::Rebase => program.append(Opcode::RebaseBranch {
                        branch: upstream_ref,
                    }),
                    SyncPerennialStrategy::Merge => {
                        program.append(Opcode::Merge { branch: upstream_ref })
                    }
                }
            }
            if push_branch && online && info.has_tracking_branch() {
                program.append(Opcode::Push {
                    branch: branch.clone(),
                    force_if_includes: false,
                    no_push_hook: !ctx.config.push_hook,
                });
            }
        }
        BranchType::Contribution => {
            if let (true, Some(remote)) = (online && info.has_tracking_branch(), &info.remote_name)
            {
                program.append(Opcode::Merge {
                    branch: remote.to_string(),
                });
                if push_branch {
                    program.append(Opcode::Push {
                        branch: branch.clone(),
                        force_if_includes: false,
                        no_push_hook: !ctx.config.push_hook,
                    });
                }
            }
        }
        BranchType::Observed => {
            if let (true, Some(remote)) = (online && info.has_tracking_branch(), &info.remote_name)
            {
                // Observed branches are other people's work: absorb, never push.
                program.append(Opcode::Merge {
                    branch: remote.to_string(),
                });
            }
        }
    }
    program.append(Opcode::EndOfBranchProgram);
    Ok(())
}
