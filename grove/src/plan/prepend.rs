//! Planner for `grove prepend`: insert a new branch between the current
//! branch and its parent.

use crate::core::branch::LocalBranchName;
use crate::errors::{Error, Result};
use crate::plan::sync::branch_sync_program;
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::{ensure_creatable, PlanContext};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

pub fn plan(ctx: &PlanContext, target: &LocalBranchName) -> Result<Program> {
    ensure_creatable(ctx, target)?;
    let current = ctx.active().clone();
    let parent = ctx
        .config
        .lineage
        .parent(&current)
        .cloned()
        .ok_or_else(|| {
            Error::user_misuse(format!(
                "branch {current} has no recorded parent; only feature branches can be prepended to"
            ))
        })?;

    let mut program = Program::new();
    program.append(Opcode::Fetch);
    for branch in ctx.config.lineage.branch_and_ancestors(&current) {
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
    program.append(Opcode::SetParent {
        child: current.clone(),
        parent: target.clone(),
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
            previous_branch_candidates: vec![current],
        },
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local, plan_config, snapshot_with_branches};

    /// Prepending inserts the new branch into the lineage on both sides.
    #[test]
    fn reparents_current_branch_onto_the_new_one() {
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

        let program = plan(&ctx, &local("feature-pre")).expect("plan");
        let opcodes: Vec<Opcode> = program.into_iter().collect();
        assert!(opcodes.contains(&Opcode::CreateBranch {
            branch: local("feature-pre"),
            starting_point: "main".to_string(),
        }));
        assert!(opcodes.contains(&Opcode::SetParent {
            child: local("feature-pre"),
            parent: local("main"),
        }));
        assert!(opcodes.contains(&Opcode::SetParent {
            child: local("feature-a"),
            parent: local("feature-pre"),
        }));
    }

    /// The main branch has no parent, so there is nothing to prepend to.
    #[test]
    fn rejects_branches_without_a_parent() {
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

        let err = plan(&ctx, &local("feature-pre")).unwrap_err();
        assert!(err.to_string().contains("no recorded parent"));
    }
}
