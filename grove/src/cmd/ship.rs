//! `grove ship`: deliver a finished feature branch.
//!
//! The proposal lookup is the one effectful step that happens at plan time:
//! when a connector is available, the planner receives the proposal facts
//! and plans the API path instead of the local squash-merge.

use std::path::Path;

use crate::core::branch::LocalBranchName;
use crate::errors::Result;
use crate::io::dialog::Dialog;
use crate::io::hosting::{Connector, Proposal};
use crate::plan::ship::{plan, ShipArgs};
use crate::vm::program::Program;

use super::{execute_program, open_repo, CommandContext, OpenOutcome};

pub fn run(
    dir: &Path,
    branch: Option<String>,
    message: Option<String>,
    dry_run: bool,
    dialog: &mut dyn Dialog,
    connector: Option<&dyn Connector>,
) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let ctx = *ctx;
    let branch = branch.map(LocalBranchName::new).transpose()?;
    let mut args = ShipArgs {
        branch: branch.clone(),
        message,
        ..ShipArgs::default()
    };
    if let Some(connector) = connector {
        let branch_name = branch.unwrap_or_else(|| ctx.snapshot.active.clone());
        look_up_proposals(&ctx, connector, &branch_name, &mut args)?;
    }
    let program = plan(&ctx.plan_context()?, &args)?;
    execute_program(ctx, "ship", program, Program::new(), connector)
}

fn look_up_proposals(
    ctx: &CommandContext,
    connector: &dyn Connector,
    branch: &LocalBranchName,
    args: &mut ShipArgs,
) -> Result<()> {
    if !ctx.config.full.is_online() {
        return Ok(());
    }
    let parent = ctx
        .config
        .full
        .lineage
        .parent(branch)
        .cloned()
        .unwrap_or_else(|| ctx.config.full.main_branch.clone());
    args.proposal = connector.find_proposal(branch, &parent)?;
    if let Some(proposal) = &args.proposal {
        args.default_proposal_message = Some(connector.default_proposal_message(proposal));
    }
    let children = ctx.config.full.lineage.children(branch);
    let mut child_proposals: Vec<Proposal> = Vec::new();
    for child in children {
        if let Some(found) = connector.find_proposal(&child, branch)? {
            child_proposals.push(found);
        }
    }
    args.proposals_of_children = child_proposals;
    Ok(())
}
