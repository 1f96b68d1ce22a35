//! `grove status`: report the persisted run state.

use std::path::Path;

use chrono::Utc;

use crate::config::store::Config;
use crate::errors::{Error, Result};
use crate::io::git::backend::Backend;
use crate::io::state_store::{self, StatePaths};

pub fn run(dir: &Path) -> Result<()> {
    let probe = Backend::new(dir);
    let root = probe
        .root_dir()
        .map_err(|_| Error::user_misuse("not inside a git repository"))?;
    let backend = Backend::new(&root);
    // Surface configuration problems here too; status is the first thing
    // users run when something looks off.
    let _ = Config::load(&root, false)?;
    let paths = StatePaths::new(&backend.git_dir()?);

    match state_store::load(&paths.runstate)? {
        Some(state) if state.is_unfinished() => {
            let details = state.unfinished_details.as_ref().expect("unfinished");
            println!(
                "`grove {}` is unfinished (suspended on {} at {})",
                state.command, details.end_branch, details.end_time
            );
            println!(
                "  {} opcodes done, {} pending",
                state.finished_program.len(),
                state.run_program.len()
            );
            if let Some(failed) = &state.failed_opcode {
                println!("  failed opcode: {}", failed.name());
            }
            if state_store::is_stale(&state, Utc::now()) {
                println!("  this state is stale; the next command will ask what to do with it");
            }
            print!("resume with `grove continue`");
            if details.can_skip {
                print!(", `grove skip`");
            }
            println!(", `grove abort`, or `grove undo`");
        }
        Some(state) => {
            println!("`grove {}` finished but left its state behind", state.command);
        }
        None => println!("no command in progress"),
    }
    match state_store::load(&paths.undo)? {
        Some(state) => println!("`grove {}` can be undone with `grove undo`", state.command),
        None => {}
    }
    Ok(())
}
