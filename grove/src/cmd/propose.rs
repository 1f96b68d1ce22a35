//! `grove propose`: push the current branch and print the platform URL
//! for opening a proposal.

use std::path::Path;

use crate::errors::Result;
use crate::io::dialog::Dialog;
use crate::io::hosting::platform_for;
use crate::plan;
use crate::vm::program::Program;

use super::{execute_program, open_repo, OpenOutcome};

pub fn run(dir: &Path, dry_run: bool, dialog: &mut dyn Dialog) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let ctx = *ctx;
    let origin_url = ctx.backend.origin_url();
    let platform = platform_for(&ctx.config.full, origin_url.as_deref());
    let program = plan::propose::plan(&ctx.plan_context()?, platform, origin_url.as_deref())?;
    execute_program(ctx, "propose", program, Program::new(), None)
}
