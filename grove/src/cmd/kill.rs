//! `grove kill`: remove an obsolete branch.

use std::path::Path;

use crate::core::branch::LocalBranchName;
use crate::errors::Result;
use crate::io::dialog::Dialog;
use crate::plan;

use super::{execute_program, open_repo, OpenOutcome};

pub fn run(dir: &Path, branch: Option<String>, dry_run: bool, dialog: &mut dyn Dialog) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let ctx = *ctx;
    let branch = branch.map(LocalBranchName::new).transpose()?;
    let kill_plan = plan::kill::plan(&ctx.plan_context()?, branch)?;
    execute_program(
        ctx,
        "kill",
        kill_plan.program,
        kill_plan.final_undo_program,
        None,
    )
}
