//! Command wiring: open the repository, capture snapshots, consult the
//! planner, and hand the program to the interpreter.

pub mod append;
pub mod config_cmd;
pub mod hack;
pub mod kill;
pub mod prepend;
pub mod propose;
pub mod rename;
pub mod resume;
pub mod set_parent;
pub mod ship;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::config::store::Config;
use crate::core::branch::LocalBranchName;
use crate::core::branches::BranchesSnapshot;
use crate::errors::{Error, Result};
use crate::io::dialog::Dialog;
use crate::io::git::backend::{Backend, RepoStatus};
use crate::io::git::frontend::{DryRunFrontend, Frontend, ShellFrontend};
use crate::io::hosting::Connector;
use crate::io::state_store::{self, StatePaths};
use crate::plan::PlanContext;
use crate::vm::interpreter;
use crate::vm::program::Program;
use crate::vm::run_state::RunState;
use crate::vm::VmContext;

/// Everything a command needs after the repository has been opened.
pub struct CommandContext {
    pub backend: Backend,
    pub config: Config,
    pub snapshot: BranchesSnapshot,
    pub repo_status: RepoStatus,
    pub stash_size: usize,
    pub previous_branch: Option<LocalBranchName>,
    pub paths: StatePaths,
    pub root: PathBuf,
    pub dry_run: bool,
}

/// Result of opening the repository for a new command.
pub enum OpenOutcome {
    Ready(Box<CommandContext>),
    /// An unfinished previous command was handled (continued); the user
    /// re-runs their command afterwards.
    Handled,
}

/// Open the repository, arbitrate any unfinished previous command, and
/// capture the begin snapshot.
pub fn open_repo(dir: &Path, dry_run: bool, dialog: &mut dyn Dialog) -> Result<OpenOutcome> {
    let probe = Backend::new(dir);
    let root = probe
        .root_dir()
        .map_err(|_| Error::user_misuse("not inside a git repository"))?;
    let backend = Backend::new(&root);
    let git_dir = backend.git_dir()?;
    let paths = StatePaths::new(&git_dir);
    let mut config = Config::load(&root, dry_run)?;
    if handle_unfinished_state(&backend, &mut config, &root, &paths, dialog)? {
        return Ok(OpenOutcome::Handled);
    }
    let snapshot = backend.branches_snapshot()?;
    let repo_status = backend.repo_status()?;
    let stash_size = backend.stash_size()?;
    let previous_branch = backend.previously_checked_out_branch();
    debug!(active = %snapshot.active, branches = snapshot.branches.len(), "repository opened");
    Ok(OpenOutcome::Ready(Box::new(CommandContext {
        backend,
        config,
        snapshot,
        repo_status,
        stash_size,
        previous_branch,
        paths,
        root,
        dry_run,
    })))
}

/// Deal with a persisted unfinished command before a new one may start.
/// Returns true when the old command was continued in place.
fn handle_unfinished_state(
    backend: &Backend,
    config: &mut Config,
    root: &Path,
    paths: &StatePaths,
    dialog: &mut dyn Dialog,
) -> Result<bool> {
    let Some(state) = state_store::load(&paths.runstate)? else {
        return Ok(false);
    };
    if !state.is_unfinished() {
        // A crash between finalize steps can leave a finished state behind.
        state_store::delete(&paths.runstate)?;
        return Ok(false);
    }
    let status = backend.repo_status()?;
    let operation_in_progress = status.rebase_in_progress || status.merge_in_progress;
    if !state_store::is_stale(&state, Utc::now()) && !operation_in_progress {
        return Err(Error::user_misuse(format!(
            "a previous `grove {}` is unfinished; run `grove continue`, `grove skip`, \
             `grove abort`, or `grove undo` first",
            state.command
        )));
    }
    let prompt = format!(
        "found an unfinished `grove {}` from {}; what now?",
        state.command,
        state
            .unfinished_details
            .as_ref()
            .map(|details| details.end_time.to_rfc3339())
            .unwrap_or_default()
    );
    let choice = dialog.choose(&prompt, &["discard", "continue", "abort"])?;
    match choice {
        0 => {
            state_store::delete(&paths.runstate)?;
            Ok(false)
        }
        1 => {
            let frontend = ShellFrontend::new(root);
            let mut vm = VmContext {
                backend,
                frontend: &frontend,
                config,
                connector: None,
            };
            interpreter::continue_run(&mut vm, paths)?;
            Ok(true)
        }
        _ => {
            let frontend = ShellFrontend::new(root);
            let mut vm = VmContext {
                backend,
                frontend: &frontend,
                config,
                connector: None,
            };
            interpreter::abort_run(&mut vm, paths)?;
            Ok(false)
        }
    }
}

impl CommandContext {
    /// The pure facts planners work from.
    pub fn plan_context(&self) -> Result<PlanContext<'_>> {
        Ok(PlanContext {
            config: &self.config.full,
            snapshot: &self.snapshot,
            previous_branch: self.previous_branch.clone(),
            has_open_changes: self.repo_status.open_changes,
            has_origin: self.backend.has_origin()?,
            has_upstream: self.backend.has_upstream()?,
            dry_run: self.dry_run,
        })
    }
}

/// Build the run state and drive the full-mode interpreter.
pub fn execute_program(
    ctx: CommandContext,
    command: &str,
    program: Program,
    final_undo_program: Program,
    connector: Option<&dyn Connector>,
) -> Result<()> {
    let begin_config_snapshot = ctx.config.snapshot()?;
    let mut run_state = RunState::new(
        command,
        ctx.dry_run,
        ctx.snapshot.clone(),
        begin_config_snapshot,
        ctx.stash_size,
        program,
    );
    run_state.final_undo_program = final_undo_program;

    let mut config = ctx.config;
    if ctx.dry_run {
        let frontend = DryRunFrontend::new();
        let mut vm = VmContext {
            backend: &ctx.backend,
            frontend: &frontend,
            config: &mut config,
            connector,
        };
        return interpreter::execute(run_state, &mut vm, &ctx.paths);
    }
    let frontend = ShellFrontend::new(&ctx.root);
    let mut vm = VmContext {
        backend: &ctx.backend,
        frontend: &frontend,
        config: &mut config,
        connector,
    };
    interpreter::execute(run_state, &mut vm, &ctx.paths)
}

/// Run a small configuration program in light mode.
pub fn execute_light_program(ctx: CommandContext, program: Program) -> Result<()> {
    let mut config = ctx.config;
    let shell;
    let dry;
    let frontend: &dyn Frontend = if ctx.dry_run {
        dry = DryRunFrontend::new();
        &dry
    } else {
        shell = ShellFrontend::new(&ctx.root);
        &shell
    };
    let mut messages = Vec::new();
    let mut snapshot = ctx.snapshot;
    let mut env = crate::vm::RunEnv {
        backend: &ctx.backend,
        frontend,
        config: &mut config,
        connector: None,
        messages: &mut messages,
        snapshot: &mut snapshot,
    };
    crate::vm::light::execute_light(program, &mut env);
    for message in messages {
        println!("{message}");
    }
    Ok(())
}
