//! `grove set-parent`: pick a new parent for the current branch.
//!
//! Configuration-only, so it runs in light mode with no undo capture.

use std::path::Path;

use crate::core::branch::LocalBranchName;
use crate::errors::{Error, Result};
use crate::io::dialog::Dialog;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

use super::{execute_light_program, open_repo, OpenOutcome};

pub fn run(dir: &Path, dry_run: bool, dialog: &mut dyn Dialog) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let ctx = *ctx;
    let branch = ctx.snapshot.active.clone();
    if ctx.config.full.is_main_or_perennial(&branch) {
        return Err(Error::user_misuse(format!(
            "branch {branch} is a perennial branch and has no parent"
        )));
    }
    let candidates = parent_candidates(&ctx, &branch);
    if candidates.is_empty() {
        return Err(Error::user_misuse("no possible parent branches found"));
    }
    let options: Vec<&str> = candidates.iter().map(|name| name.as_str()).collect();
    let current_parent = ctx.config.full.lineage.parent(&branch);
    let prompt = match current_parent {
        Some(parent) => format!("select a new parent for {branch} (currently {parent})"),
        None => format!("select the parent for {branch}"),
    };
    let choice = dialog.choose(&prompt, &options)?;
    let parent = candidates[choice].clone();
    let program = Program::from(vec![Opcode::SetParent {
        child: branch,
        parent,
    }]);
    execute_light_program(ctx, program)
}

/// Main, perennials, then other local branches; never the branch itself or
/// one of its descendants (that would create a lineage cycle).
fn parent_candidates(
    ctx: &super::CommandContext,
    branch: &LocalBranchName,
) -> Vec<LocalBranchName> {
    let config = &ctx.config.full;
    let mut candidates = vec![config.main_branch.clone()];
    for perennial in &config.perennial_branches {
        if ctx.snapshot.has_local_branch(perennial) {
            candidates.push(perennial.clone());
        }
    }
    for info in ctx.snapshot.local_branches() {
        let name = info.local_name.as_ref().expect("local branch");
        if candidates.contains(name) || name == branch {
            continue;
        }
        if config.lineage.ancestors(name).contains(branch) {
            continue;
        }
        candidates.push(name.clone());
    }
    candidates
}
