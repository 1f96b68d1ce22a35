//! Planner for `grove append`: a new branch whose parent is the current
//! branch.

use crate::core::branch::LocalBranchName;
use crate::errors::Result;
use crate::plan::sync::branch_sync_program;
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::{ensure_creatable, PlanContext};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

pub fn plan(ctx: &PlanContext, target: &LocalBranchName) -> Result<Program> {
    ensure_creatable(ctx, target)?;
    let parent = ctx.active().clone();
    let mut program = Program::new();
    program.append(Opcode::Fetch);
    for branch in ctx.config.lineage.branch_and_ancestors(&parent) {
        if ctx.snapshot.has_local_branch(&branch) {
            branch_sync_program(&mut program, ctx, &branch, true)?;
        }
    }
    program.append(Opcode::CreateBranch {
        branch: target.clone(),
        starting_point: parent.to_string(),
    });
    program.append(Opcode::Checkout {
        branch: target.clone(),
    });
    program.append(Opcode::SetParent {
        child: target.clone(),
        parent,
    });
    if ctx.config.push_new_branches && ctx.config.is_online() && ctx.has_origin {
        program.append(Opcode::CreateTrackingBranch {
            branch: target.clone(),
        });
    }
    wrap(
        &mut program,
        WrapOptions {
            stash_open_changes: ctx.has_open_changes,
            previous_branch_candidates: vec![ctx.active().clone()],
        },
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local, plan_config, snapshot_with_branches};

    /// Appending from a feature branch syncs the whole chain first and
    /// records the current branch as parent.
    #[test]
    fn parent_is_the_current_branch_and_chain_syncs_first() {
        let config = plan_config("main", &[("feature-a", "main")]);
        let snapshot =
            snapshot_with_branches("feature-a", &[("main", "111111"), ("feature-a", "222222")]);
        let ctx = PlanContext {
            config: &config,
            snapshot: &snapshot,
            previous_branch: None,
            has_open_changes: false,
            has_origin: true,
            has_upstream: false,
            dry_run: false,
        };

        let program = plan(&ctx, &local("feature-b")).expect("plan");
        let opcodes: Vec<Opcode> = program.into_iter().collect();

        // Both main and feature-a get a sync sub-program, in ancestor order.
        let checkouts: Vec<&Opcode> = opcodes
            .iter()
            .filter(|op| matches!(op, Opcode::Checkout { .. }))
            .collect();
        assert_eq!(
            checkouts[0],
            &Opcode::Checkout {
                branch: local("main")
            }
        );
        assert!(opcodes.contains(&Opcode::SetParent {
            child: local("feature-b"),
            parent: local("feature-a"),
        }));
        assert!(opcodes.contains(&Opcode::CreateBranch {
            branch: local("feature-b"),
            starting_point: "feature-a".to_string(),
        }));
    }

    #[test]
    fn rejects_existing_branch_names() {
        let config = plan_config("main", &[]);
        let snapshot = snapshot_with_branches("main", &[("main", "111111")]);
        let ctx = PlanContext {
            config: &config,
            snapshot: &snapshot,
            previous_branch: None,
            has_open_changes: false,
            has_origin: true,
            has_upstream: false,
            dry_run: false,
        };
        assert!(plan(&ctx, &local("main")).is_err());
    }
}
