//! `grove sync`: bring branches up to date with their parents and
//! tracking branches.

use std::path::Path;

use crate::core::branch::LocalBranchName;
use crate::errors::Result;
use crate::io::dialog::Dialog;
use crate::plan::sync::{plan, SyncArgs};
use crate::vm::program::Program;

use super::{execute_program, open_repo, OpenOutcome};

pub fn run(
    dir: &Path,
    branches: Vec<String>,
    all: bool,
    dry_run: bool,
    dialog: &mut dyn Dialog,
) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let ctx = *ctx;
    let branches = branches
        .into_iter()
        .map(LocalBranchName::new)
        .collect::<Result<Vec<_>>>()?;
    let program = plan(&ctx.plan_context()?, &SyncArgs { branches, all })?;
    execute_program(ctx, "sync", program, Program::new(), None)
}
