//! `grove rename-branch`: give a branch a new name everywhere it exists.

use std::path::Path;

use crate::core::branch::LocalBranchName;
use crate::errors::Result;
use crate::io::dialog::Dialog;
use crate::plan;
use crate::vm::program::Program;

use super::{execute_program, open_repo, OpenOutcome};

pub fn run(
    dir: &Path,
    old: Option<String>,
    new: String,
    force: bool,
    dry_run: bool,
    dialog: &mut dyn Dialog,
) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let ctx = *ctx;
    let old = match old {
        Some(name) => LocalBranchName::new(name)?,
        None => ctx.snapshot.active.clone(),
    };
    let new = LocalBranchName::new(new)?;
    let program = plan::rename::plan(&ctx.plan_context()?, &old, &new, force)?;
    execute_program(ctx, "rename-branch", program, Program::new(), None)
}
