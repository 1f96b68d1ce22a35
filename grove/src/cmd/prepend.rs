//! `grove prepend`: insert a new branch between the current branch and
//! its parent.

use std::path::Path;

use crate::core::branch::LocalBranchName;
use crate::errors::Result;
use crate::io::dialog::Dialog;
use crate::plan;
use crate::vm::program::Program;

use super::{execute_program, open_repo, OpenOutcome};

pub fn run(dir: &Path, name: String, dry_run: bool, dialog: &mut dyn Dialog) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let ctx = *ctx;
    let target = LocalBranchName::new(name)?;
    let program = plan::prepend::plan(&ctx.plan_context()?, &target)?;
    execute_program(ctx, "prepend", program, Program::new(), None)
}
