//! `grove hack`: create a new feature branch off main, or promote the
//! current branch to a feature branch.

use std::path::Path;

use crate::config::keys::Key;
use crate::core::branch::LocalBranchName;
use crate::core::branches::BranchType;
use crate::errors::{Error, Result};
use crate::io::dialog::Dialog;
use crate::plan;
use crate::vm::program::Program;

use super::{execute_program, open_repo, OpenOutcome};

pub fn run(dir: &Path, name: Option<String>, dry_run: bool, dialog: &mut dyn Dialog) -> Result<()> {
    let OpenOutcome::Ready(ctx) = open_repo(dir, dry_run, dialog)? else {
        return Ok(());
    };
    let mut ctx = *ctx;
    match name {
        Some(name) => {
            let target = LocalBranchName::new(name)?;
            let program = plan::hack::plan(&ctx.plan_context()?, &target)?;
            execute_program(ctx, "hack", program, Program::new(), None)
        }
        None => {
            let branch = ctx.snapshot.active.clone();
            let list_key = match ctx.config.full.branch_type(&branch) {
                BranchType::Feature => {
                    return Err(Error::user_misuse(format!(
                        "branch {branch} is already a feature branch"
                    )));
                }
                BranchType::Main => {
                    return Err(Error::user_misuse(
                        "the main branch cannot become a feature branch",
                    ));
                }
                BranchType::Perennial => {
                    return Err(Error::user_misuse(format!(
                        "perennial branch {branch} cannot become a feature branch"
                    )));
                }
                BranchType::Contribution => Key::ContributionBranches,
                BranchType::Observed => Key::ObservedBranches,
                BranchType::Parked => Key::ParkedBranches,
            };
            ctx.config.remove_from_branch_list(list_key, &branch)?;
            println!("branch {branch} is now a feature branch");
            Ok(())
        }
    }
}
