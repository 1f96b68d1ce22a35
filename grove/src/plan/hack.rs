//! Planner for `grove hack`: a new feature branch off the main branch.

use crate::core::branch::LocalBranchName;
use crate::errors::Result;
use crate::plan::sync::branch_sync_program;
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::{ensure_creatable, PlanContext};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

pub fn plan(ctx: &PlanContext, target: &LocalBranchName) -> Result<Program> {
    ensure_creatable(ctx, target)?;
    let main = ctx.config.main_branch.clone();
    let mut program = Program::new();
    program.append(Opcode::Fetch);
    if ctx.snapshot.has_local_branch(&main) {
        branch_sync_program(&mut program, ctx, &main, true)?;
    }
    program.append(Opcode::CreateBranch {
        branch: target.clone(),
        starting_point: main.to_string(),
    });
    program.append(Opcode::Checkout {
        branch: target.clone(),
    });
    program.append(Opcode::SetParent {
        child: target.clone(),
        parent: main,
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
    use crate::test_support::{local, plan_config, snapshot_of, snapshot_with_branches, tracking_branch_info};

    fn ctx_for<'a>(
        config: &'a crate::config::full::FullConfig,
        snapshot: &'a crate::core::branches::BranchesSnapshot,
    ) -> PlanContext<'a> {
        PlanContext {
            config,
            snapshot,
            previous_branch: None,
            has_open_changes: false,
            has_origin: true,
            has_upstream: false,
            dry_run: false,
        }
    }

    /// The hack happy path: empty lineage, main is active and local-only.
    /// Fetch, sync main, create the branch off main, check it out, record
    /// the lineage.
    #[test]
    fn plans_fetch_sync_create_checkout_set_parent() {
        let config = plan_config("main", &[]);
        let snapshot = snapshot_with_branches("main", &[("main", "111111")]);
        let ctx = ctx_for(&config, &snapshot);

        let program = plan(&ctx, &local("feature-a")).expect("plan");
        let opcodes: Vec<Opcode> = program.into_iter().collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::Fetch,
                Opcode::Checkout {
                    branch: local("main")
                },
                Opcode::EndOfBranchProgram,
                Opcode::CreateBranch {
                    branch: local("feature-a"),
                    starting_point: "main".to_string(),
                },
                Opcode::Checkout {
                    branch: local("feature-a")
                },
                Opcode::SetParent {
                    child: local("feature-a"),
                    parent: local("main"),
                },
                Opcode::PreserveCheckoutHistory {
                    previous_branch_candidates: vec![local("main")],
                },
            ]
        );
    }

    #[test]
    fn existing_local_branch_is_rejected() {
        let config = plan_config("main", &[]);
        let snapshot =
            snapshot_with_branches("main", &[("main", "111111"), ("feature-a", "222222")]);
        let ctx = ctx_for(&config, &snapshot);

        let err = plan(&ctx, &local("feature-a")).unwrap_err();
        assert!(err.to_string().contains("already a branch"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn existing_tracking_branch_is_rejected() {
        let config = plan_config("main", &[]);
        let mut snapshot = snapshot_with_branches("main", &[("main", "111111")]);
        snapshot
            .branches
            .push(crate::test_support::remote_only_info("feature-a", "333333"));
        let ctx = ctx_for(&config, &snapshot);

        let err = plan(&ctx, &local("feature-a")).unwrap_err();
        assert!(err.to_string().contains("remote"));
    }

    #[test]
    fn push_new_branches_adds_a_tracking_branch() {
        let mut config = plan_config("main", &[]);
        config.push_new_branches = true;
        let snapshot = snapshot_of("main", vec![tracking_branch_info("main", "111111")]);
        let ctx = ctx_for(&config, &snapshot);

        let program = plan(&ctx, &local("feature-a")).expect("plan");
        assert!(program.iter().any(|op| matches!(
            op,
            Opcode::CreateTrackingBranch { branch } if branch == &local("feature-a")
        )));
    }

    #[test]
    fn open_changes_ride_along_in_the_stash() {
        let config = plan_config("main", &[]);
        let snapshot = snapshot_with_branches("main", &[("main", "111111")]);
        let mut ctx = ctx_for(&config, &snapshot);
        ctx.has_open_changes = true;

        let program = plan(&ctx, &local("feature-a")).expect("plan");
        let opcodes: Vec<Opcode> = program.into_iter().collect();
        assert_eq!(opcodes.first(), Some(&Opcode::StashOpenChanges));
        assert_eq!(opcodes.last(), Some(&Opcode::RestoreOpenChanges));
    }
}
