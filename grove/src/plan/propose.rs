//! Planner for `grove propose`: sync the branch, then hand the user the
//! platform's new-proposal URL.

use crate::config::values::HostingPlatform;
use crate::errors::{Error, Result};
use crate::io::hosting::{new_proposal_url, parse_forge_url};
use crate::plan::sync::branch_sync_program;
use crate::plan::wrap::{wrap, WrapOptions};
use crate::plan::PlanContext;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

pub fn plan(
    ctx: &PlanContext,
    platform: Option<HostingPlatform>,
    origin_url: Option<&str>,
) -> Result<Program> {
    if !ctx.config.is_online() {
        return Err(Error::user_misuse("cannot create proposals in offline mode"));
    }
    let branch = ctx.active().clone();
    let parent = ctx
        .config
        .lineage
        .parent(&branch)
        .cloned()
        .ok_or_else(|| {
            Error::user_misuse(format!(
                "branch {branch} has no recorded parent; run `grove set-parent` first"
            ))
        })?;
    let platform = platform.ok_or_else(|| {
        Error::ConfigInvalid(
            "cannot determine the hosting platform; set `grove.hosting-platform`".to_string(),
        )
    })?;
    let forge = origin_url.and_then(parse_forge_url).ok_or_else(|| {
        Error::user_misuse("the origin remote URL cannot be parsed into a forge URL")
    })?;

    let mut program = Program::new();
    program.append(Opcode::Fetch);
    for link in ctx.config.lineage.branch_and_ancestors(&branch) {
        if ctx.snapshot.has_local_branch(&link) {
            branch_sync_program(&mut program, ctx, &link, true)?;
        }
    }
    if !ctx
        .snapshot
        .find_by_local_name(&branch)
        .is_some_and(|info| info.has_tracking_branch())
    {
        program.append(Opcode::CreateTrackingBranch {
            branch: branch.clone(),
        });
    }
    let url = new_proposal_url(platform, &forge, &branch, &parent);
    program.append(Opcode::QueueMessage {
        message: format!("open a proposal at: {url}"),
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
