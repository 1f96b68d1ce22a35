//! Planner for `grove ship`: squash-merge a finished feature branch into
//! its parent and clean up everywhere it exists.

use crate::core::branch::LocalBranchName;
use crate::core::branches::BranchType;
use crate::errors::{Error, Result};
use crate::io::hosting::Proposal;
use crate::plan::sync::branch_sync_program;
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::{require_branch, PlanContext};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

#[derive(Debug, Clone, Default)]
pub struct ShipArgs {
    /// Branch to ship; defaults to the current branch.
    pub branch: Option<LocalBranchName>,
    /// Commit message for the squash commit.
    pub message: Option<String>,
    /// Proposal found at the hosting platform, if any. When set, the ship
    /// goes through the connector API instead of a local squash-merge.
    pub proposal: Option<Proposal>,
    /// Proposals of child branches, re-targeted to the new parent.
    pub proposals_of_children: Vec<Proposal>,
    pub default_proposal_message: Option<String>,
}

pub fn plan(ctx: &PlanContext, args: &ShipArgs) -> Result<Program> {
    let branch = args.branch.clone().unwrap_or_else(|| ctx.active().clone());
    let info = require_branch(ctx, &branch)?;
    if ctx.config.branch_type(&branch) != BranchType::Feature {
        return Err(Error::user_misuse(format!(
            "branch {branch} is not a feature branch; only feature branches can be shipped"
        )));
    }
    ensure_parent_is_main_or_perennial(ctx, &branch)?;
    let parent = ctx
        .config
        .lineage
        .parent(&branch)
        .cloned()
        .unwrap_or_else(|| ctx.config.main_branch.clone());
    require_branch(ctx, &parent)?;
    let ship_via_api = args.proposal.is_some() && ctx.config.is_online();
    if !ship_via_api && args.message.is_none() {
        return Err(Error::user_misuse(
            "provide a commit message for the squash commit with -m",
        ));
    }
    let children = ctx.config.lineage.children(&branch);
    let shipping_initial = &branch == ctx.active();

    let mut program = Program::new();
    if ctx.config.sync_before_ship {
        branch_sync_program(&mut program, ctx, &parent, true)?;
        // The shipped branch syncs locally only; it is about to disappear.
        branch_sync_program(&mut program, ctx, &branch, false)?;
    }
    program.append(Opcode::EnsureHasShippableChanges {
        branch: branch.clone(),
        parent: parent.clone(),
    });
    if ship_via_api {
        let proposal = args.proposal.as_ref().expect("checked via ship_via_api");
        program.append(Opcode::Checkout {
            branch: branch.clone(),
        });
        program.append(Opcode::Push {
            branch: branch.clone(),
            force_if_includes: false,
            no_push_hook: !ctx.config.push_hook,
        });
        for child_proposal in &args.proposals_of_children {
            program.append(Opcode::UpdateProposalTarget {
                proposal_number: child_proposal.number,
                new_target: parent.clone(),
            });
        }
        program.append(Opcode::Checkout {
            branch: parent.clone(),
        });
        program.append(Opcode::ConnectorMergeProposal {
            branch: branch.clone(),
            proposal_number: proposal.number,
            commit_message: args.message.clone(),
            proposal_message: args
                .default_proposal_message
                .clone()
                .unwrap_or_else(|| format!("{} (#{})", proposal.title, proposal.number)),
        });
        program.append(Opcode::PullCurrentBranch);
    } else {
        program.append(Opcode::Checkout {
            branch: parent.clone(),
        });
        program.append(Opcode::SquashMerge {
            branch: branch.clone(),
            commit_message: args.message.clone().expect("checked above"),
            parent: parent.clone(),
        });
    }
    if ctx.has_origin && ctx.config.is_online() {
        program.append(Opcode::Push {
            branch: parent.clone(),
            force_if_includes: false,
            no_push_hook: !ctx.config.push_hook,
        });
    }
    // Deleting the tracking branch is safe when shipping via API (the
    // proposal merge already ran there) or when no child branch still
    // builds on it.
    let may_delete_tracking = ship_via_api
        || (info.has_tracking_branch() && children.is_empty() && ctx.config.is_online());
    if may_delete_tracking && ctx.config.ship_delete_tracking_branch {
        if let Some(remote) = &info.remote_name {
            program.append(Opcode::DeleteTrackingBranch {
                branch: remote.clone(),
            });
        }
    }
    program.append(Opcode::DeleteLocalBranch {
        branch: branch.clone(),
    });
    if !ctx.dry_run {
        program.append(Opcode::DeleteParentBranch {
            branch: branch.clone(),
        });
    }
    for child in children {
        program.append(Opcode::ChangeParent {
            branch: child,
            parent: parent.clone(),
        });
    }
    if !shipping_initial {
        program.append(Opcode::Checkout {
            branch: ctx.active().clone(),
        });
    }
    let mut candidates = Vec::new();
    if let Some(previous) = &ctx.previous_branch {
        candidates.push(previous.clone());
    }
    wrap(
        &mut program,
        WrapOptions {
            stash_open_changes: !shipping_initial && ctx.has_open_changes,
            previous_branch_candidates: candidates,
        },
    );
    Ok(program)
}

/// Only direct children of main or a perennial branch can ship; anything
/// deeper would silently ship its unshipped ancestors too.
fn ensure_parent_is_main_or_perennial(ctx: &PlanContext, branch: &LocalBranchName) -> Result<()> {
    let Some(parent) = ctx.config.lineage.parent(branch) else {
        return Ok(());
    };
    if ctx.config.is_main_or_perennial(parent) {
        return Ok(());
    }
    let ancestors = ctx.config.lineage.ancestors(branch);
    let unshipped: Vec<String> = ancestors
        .iter()
        .filter(|ancestor| !ctx.config.is_main_or_perennial(ancestor))
        .map(|ancestor| ancestor.to_string())
        .collect();
    let oldest = unshipped
        .first()
        .cloned()
        .unwrap_or_else(|| parent.to_string());
    Err(Error::user_misuse(format!(
        "shipping this branch would also ship {}; ship {oldest} first",
        unshipped.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        branch_info, local, plan_config, snapshot_of, snapshot_with_branches,
        tracking_branch_info,
    };

    fn ctx_for<'a>(
        config: &'a crate::config::full::FullConfig,
        snapshot: &'a crate::core::branches::BranchesSnapshot,
    ) -> PlanContext<'a> {
        PlanContext {
            config,
            snapshot,
            previous_branch: Some(local("previous")),
            has_open_changes: false,
            has_origin: true,
            has_upstream: false,
            dry_run: false,
        }
    }

    /// Ship via local squash: one commit ahead, tracking branch exists, no
    /// connector.
    #[test]
    fn plans_squash_merge_push_and_cleanup() {
        let config = plan_config("main", &[("feature-a", "main")]);
        let snapshot = snapshot_of(
            "feature-a",
            vec![
                branch_info("main", "111111"),
                tracking_branch_info("feature-a", "222222"),
            ],
        );
        let ctx = ctx_for(&config, &snapshot);

        let program = plan(
            &ctx,
            &ShipArgs {
                message: Some("msg".to_string()),
                ..ShipArgs::default()
            },
        )
        .expect("plan");
        let opcodes: Vec<Opcode> = program.into_iter().collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::EnsureHasShippableChanges {
                    branch: local("feature-a"),
                    parent: local("main"),
                },
                Opcode::Checkout {
                    branch: local("main")
                },
                Opcode::SquashMerge {
                    branch: local("feature-a"),
                    commit_message: "msg".to_string(),
                    parent: local("main"),
                },
                Opcode::Push {
                    branch: local("main"),
                    force_if_includes: false,
                    no_push_hook: false,
                },
                Opcode::DeleteTrackingBranch {
                    branch: crate::core::branch::RemoteBranchName::new("origin/feature-a")
                        .expect("name"),
                },
                Opcode::DeleteLocalBranch {
                    branch: local("feature-a")
                },
                Opcode::DeleteParentBranch {
                    branch: local("feature-a")
                },
                Opcode::PreserveCheckoutHistory {
                    previous_branch_candidates: vec![local("previous")],
                },
            ]
        );
    }

    /// `ship-delete-tracking-branch = false` leaves the remote branch to
    /// the origin server.
    #[test]
    fn respects_ship_delete_tracking_branch_setting() {
        let mut config = plan_config("main", &[("feature-a", "main")]);
        config.ship_delete_tracking_branch = false;
        let snapshot = snapshot_of(
            "feature-a",
            vec![
                branch_info("main", "111111"),
                tracking_branch_info("feature-a", "222222"),
            ],
        );
        let ctx = ctx_for(&config, &snapshot);

        let program = plan(
            &ctx,
            &ShipArgs {
                message: Some("msg".to_string()),
                ..ShipArgs::default()
            },
        )
        .expect("plan");
        assert!(!program
            .iter()
            .any(|op| matches!(op, Opcode::DeleteTrackingBranch { .. })));
    }

    /// Shipping a nested branch is refused, naming the branch to ship
    /// first. No program is generated.
    #[test]
    fn rejects_nested_branches() {
        let config = plan_config("main", &[("feature-a", "main"), ("feature-b", "feature-a")]);
        let snapshot = snapshot_with_branches(
            "feature-b",
            &[
                ("main", "111111"),
                ("feature-a", "222222"),
                ("feature-b", "333333"),
            ],
        );
        let ctx = ctx_for(&config, &snapshot);

        let err = plan(
            &ctx,
            &ShipArgs {
                branch: Some(local("feature-b")),
                message: Some("msg".to_string()),
                ..ShipArgs::default()
            },
        )
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("feature-a"));
        assert_eq!(err.exit_code(), 2);
    }

    /// Only feature branches ship.
    #[test]
    fn rejects_non_feature_branches() {
        let mut config = plan_config("main", &[]);
        config.observed_branches = vec![local("watched")];
        let snapshot =
            snapshot_with_branches("main", &[("main", "111111"), ("watched", "222222")]);
        let ctx = ctx_for(&config, &snapshot);

        let err = plan(
            &ctx,
            &ShipArgs {
                branch: Some(local("watched")),
                message: Some("msg".to_string()),
                ..ShipArgs::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a feature branch"));
    }

    /// Without a proposal, a commit message is mandatory.
    #[test]
    fn requires_a_commit_message_without_a_proposal() {
        let config = plan_config("main", &[("feature-a", "main")]);
        let snapshot =
            snapshot_with_branches("feature-a", &[("main", "111111"), ("feature-a", "222222")]);
        let ctx = ctx_for(&config, &snapshot);

        let err = plan(&ctx, &ShipArgs::default()).unwrap_err();
        assert!(err.to_string().contains("-m"));
    }

    /// Ship via the connector API: child proposals re-target the parent and
    /// the squash happens at the platform.
    #[test]
    fn ships_via_api_when_a_proposal_exists() {
        let config = plan_config(
            "main",
            &[("feature-a", "main"), ("feature-b", "feature-a")],
        );
        let snapshot = snapshot_of(
            "feature-a",
            vec![
                branch_info("main", "111111"),
                branch_info("feature-b", "333333"),
                tracking_branch_info("feature-a", "222222"),
            ],
        );
        let ctx = ctx_for(&config, &snapshot);

        let proposal = Proposal {
            number: 41,
            title: "add login".to_string(),
            source: local("feature-a"),
            target: local("main"),
            url: "https://example.com/41".to_string(),
        };
        let child_proposal = Proposal {
            number: 42,
            title: "polish login".to_string(),
            source: local("feature-b"),
            target: local("feature-a"),
            url: "https://example.com/42".to_string(),
        };
        let program = plan(
            &ctx,
            &ShipArgs {
                proposal: Some(proposal),
                proposals_of_children: vec![child_proposal],
                ..ShipArgs::default()
            },
        )
        .expect("plan");

        assert!(program.iter().any(|op| matches!(
            op,
            Opcode::ConnectorMergeProposal {
                proposal_number: 41,
                ..
            }
        )));
        assert!(program.iter().any(|op| matches!(
            op,
            Opcode::UpdateProposalTarget {
                proposal_number: 42,
                new_target,
            } if new_target == &local("main")
        )));
        assert!(!program
            .iter()
            .any(|op| matches!(op, Opcode::SquashMerge { .. })));
        // feature-b is re-attached to main.
        assert!(program.iter().any(|op| matches!(
            op,
            Opcode::ChangeParent { branch, parent }
                if branch == &local("feature-b") && parent == &local("main")
        )));
    }
}
