//! Full-mode interpreter: drives a program opcode by opcode, suspends on
//! conflicts, rolls back on fatal failures, and synthesizes undo data at
//! the end.

use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::errors::{Error, Result};
use crate::io::state_store::{self, StatePaths};
use crate::undo::branch_diff::undo_branches_program;
use crate::undo::config_diff::undo_config_program;
use crate::vm::opcode::{Opcode, OpcodeOutcome};
use crate::vm::program::Program;
use crate::vm::run_state::{RunState, UnfinishedDetails};
use crate::vm::{RunEnv, VmContext};

/// Execute `run_state.run_program` to completion.
///
/// On success the pending run state is deleted and the finished state
/// (with its synthesized undo program) is written for `grove undo`. On a
/// conflict in a suspendable opcode the state is persisted and
/// [`Error::ConflictSuspended`] is returned. Any other failure triggers an
/// automatic rollback to the begin snapshot and returns the original error.
#[instrument(skip_all, fields(command = %run_state.command))]
pub fn execute(mut run_state: RunState, ctx: &mut VmContext, paths: &StatePaths) -> Result<()> {
    while let Some(opcode) = run_state.run_program.pop_front() {
        debug!(opcode = opcode.name(), "running opcode");
        let outcome = {
            let mut env = RunEnv {
                backend: ctx.backend,
                frontend: ctx.frontend,
                config: &mut *ctx.config,
                connector: ctx.connector,
                messages: &mut run_state.messages,
                snapshot: &mut run_state.begin_branches_snapshot,
            };
            opcode.run(&mut env)
        };
        match outcome {
            Ok(OpcodeOutcome::Completed) => {
                run_state.abort_program.prepend_program(opcode.abort_program());
                run_state.finished_program.append(opcode);
            }
            Ok(OpcodeOutcome::Skipped) => {
                debug!(opcode = opcode.name(), "opcode skipped");
            }
            Err(err) if opcode.is_suspendable() && matches!(err, Error::VcsFailure { .. }) => {
                return suspend(run_state, opcode, err, ctx, paths);
            }
            Err(err) => {
                warn!(opcode = opcode.name(), error = %err, "opcode failed, rolling back");
                let mut scratch = Vec::new();
                rollback(&run_state, Some(&opcode), ctx, &mut scratch);
                if !run_state.dry_run {
                    state_store::delete(&paths.runstate)?;
                }
                return Err(err);
            }
        }
    }
    finalize(run_state, ctx, paths)
}

fn finalize(mut run_state: RunState, ctx: &mut VmContext, paths: &StatePaths) -> Result<()> {
    let end_branches = ctx.backend.branches_snapshot()?;
    let end_config = ctx.config.snapshot()?;
    let end_stash = ctx.backend.stash_size()?;
    if end_stash > run_state.begin_stash_size {
        println!(
            "NOTICE: a stash entry created by this command could not be restored; \
             run `git stash pop` to recover it"
        );
    }
    let mut undo_program =
        undo_branches_program(&run_state.begin_branches_snapshot, &end_branches);
    undo_program.append_program(undo_config_program(
        &run_state.begin_config_snapshot,
        &end_config,
    ));
    run_state.undo_program = undo_program;
    run_state.end_branches_snapshot = Some(end_branches);
    run_state.end_config_snapshot = Some(end_config);
    run_state.end_stash_size = Some(end_stash);
    run_state.unfinished_details = None;
    if !run_state.dry_run {
        state_store::delete(&paths.runstate)?;
        state_store::save(&paths.undo, &run_state)?;
    }
    for message in &run_state.messages {
        println!("{message}");
    }
    debug!(command = %run_state.command, "command finished");
    Ok(())
}

fn suspend(
    mut run_state: RunState,
    opcode: Opcode,
    err: Error,
    ctx: &mut VmContext,
    paths: &StatePaths,
) -> Result<()> {
    let can_skip = opcode.supports_skip();
    let end_branch = ctx
        .backend
        .current_branch()
        .unwrap_or_else(|_| run_state.begin_branches_snapshot.active.clone());
    let end_branches = ctx.backend.branches_snapshot()?;
    let end_config = ctx.config.snapshot()?;
    let mut undo_program =
        undo_branches_program(&run_state.begin_branches_snapshot, &end_branches);
    undo_program.append_program(undo_config_program(
        &run_state.begin_config_snapshot,
        &end_config,
    ));
    run_state.undo_program = undo_program;
    run_state.end_branches_snapshot = Some(end_branches);
    run_state.end_config_snapshot = Some(end_config);
    run_state.end_stash_size = Some(ctx.backend.stash_size()?);
    run_state.failed_opcode = Some(opcode);
    run_state.unfinished_details = Some(UnfinishedDetails {
        can_skip,
        end_branch,
        end_time: Utc::now(),
    });
    if !run_state.dry_run {
        state_store::save(&paths.runstate, &run_state)?;
    }
    println!("{err}");
    println!("\nto continue after resolving the conflicts, run `grove continue`");
    if can_skip {
        println!("to skip syncing this branch, run `grove skip`");
    }
    println!("to go back to where you started, run `grove abort`");
    println!("to undo what already ran, run `grove undo`");
    Err(Error::ConflictSuspended { can_skip })
}

/// Undo the work of a partially executed program: run the failed opcode's
/// cleanup plus the accumulated abort hints, then repair any remaining
/// drift against the begin snapshot. Failures here are printed, not
/// propagated, so a rollback never strands a second failure state.
fn rollback(
    run_state: &RunState,
    failed: Option<&Opcode>,
    ctx: &mut VmContext,
    messages: &mut Vec<String>,
) {
    let mut hints = failed.map(Opcode::abort_program).unwrap_or_default();
    hints.append_program(run_state.abort_program.clone());
    let mut snapshot = run_state.begin_branches_snapshot.clone();
    run_printed(hints, ctx, messages, &mut snapshot);

    let repairs = match repair_program(run_state, ctx) {
        Ok(program) => program,
        Err(err) => {
            println!("NOTICE: could not compute repairs: {err}");
            Program::new()
        }
    };
    run_printed(repairs, ctx, messages, &mut snapshot);
    println!("rolled back");
}

/// Diff the current repository against the begin snapshot.
fn repair_program(run_state: &RunState, ctx: &mut VmContext) -> Result<Program> {
    let now_branches = ctx.backend.branches_snapshot()?;
    let now_config = ctx.config.snapshot()?;
    let mut program =
        undo_branches_program(&run_state.begin_branches_snapshot, &now_branches);
    program.append_program(undo_config_program(
        &run_state.begin_config_snapshot,
        &now_config,
    ));
    Ok(program)
}

/// Run a program printing one line per action; failures become notices.
fn run_printed(
    program: Program,
    ctx: &mut VmContext,
    messages: &mut Vec<String>,
    snapshot: &mut crate::core::branches::BranchesSnapshot,
) {
    for opcode in program {
        let mut env = RunEnv {
            backend: ctx.backend,
            frontend: ctx.frontend,
            config: &mut *ctx.config,
            connector: ctx.connector,
            messages,
            snapshot,
        };
        match opcode.run(&mut env) {
            Ok(OpcodeOutcome::Completed) => println!("  {}", opcode.name()),
            Ok(OpcodeOutcome::Skipped) => {}
            Err(err) => println!("NOTICE: {err}"),
        }
    }
}

/// Resume a suspended command after the user resolved the conflicts.
pub fn continue_run(ctx: &mut VmContext, paths: &StatePaths) -> Result<()> {
    let mut run_state = require_unfinished(paths, "continue")?;
    if ctx.backend.repo_status()?.conflicts {
        return Err(Error::user_misuse(
            "there are still unresolved conflicts; resolve them before continuing",
        ));
    }
    let failed = run_state.failed_opcode.take().ok_or_else(|| {
        Error::InternalInvariant("suspended run state has no failed opcode".to_string())
    })?;
    run_state.run_program.prepend_program(failed.continue_program());
    run_state.unfinished_details = None;
    execute(run_state, ctx, paths)
}

/// Drop the rest of the failed branch's sub-program and resume.
pub fn skip_run(ctx: &mut VmContext, paths: &StatePaths) -> Result<()> {
    let mut run_state = require_unfinished(paths, "skip")?;
    let details = run_state
        .unfinished_details
        .clone()
        .expect("checked by require_unfinished");
    if !details.can_skip {
        return Err(Error::user_misuse(
            "the failed operation cannot be skipped",
        ));
    }
    let failed = run_state.failed_opcode.take().ok_or_else(|| {
        Error::InternalInvariant("suspended run state has no failed opcode".to_string())
    })?;
    while let Some(opcode) = run_state.run_program.pop_front() {
        if matches!(opcode, Opcode::EndOfBranchProgram) {
            break;
        }
    }
    run_state.run_program.prepend_program(failed.abort_program());
    run_state.unfinished_details = None;
    execute(run_state, ctx, paths)
}

/// Abort a suspended command, returning the repository to the begin state.
pub fn abort_run(ctx: &mut VmContext, paths: &StatePaths) -> Result<()> {
    let mut run_state = require_unfinished(paths, "abort")?;
    let failed = run_state.failed_opcode.take();
    let mut messages = Vec::new();
    rollback(&run_state, failed.as_ref(), ctx, &mut messages);
    state_store::delete(&paths.runstate)?;
    println!("aborted `grove {}`", run_state.command);
    Ok(())
}

/// Undo the last command: a suspended one (rollback in place) or the most
/// recently finished one (replay its undo program).
pub fn undo_run(ctx: &mut VmContext, paths: &StatePaths) -> Result<()> {
    let mut messages = Vec::new();
    if let Some(mut run_state) = state_store::load(&paths.runstate)? {
        let failed = run_state.failed_opcode.take();
        let mut program = failed
            .as_ref()
            .map(Opcode::abort_program)
            .unwrap_or_default();
        program.append_program(run_state.undo_program.clone());
        program.append_program(run_state.final_undo_program.clone());
        let mut snapshot = run_state.begin_branches_snapshot.clone();
        run_printed(program, ctx, &mut messages, &mut snapshot);
        state_store::delete(&paths.runstate)?;
        println!("undid `grove {}`", run_state.command);
        return Ok(());
    }
    let Some(run_state) = state_store::load(&paths.undo)? else {
        return Err(Error::user_misuse("nothing to undo"));
    };
    let mut program = run_state.undo_program.clone();
    program.append_program(run_state.final_undo_program.clone());
    let mut snapshot = run_state.begin_branches_snapshot.clone();
    run_printed(program, ctx, &mut messages, &mut snapshot);
    state_store::delete(&paths.undo)?;
    println!("undid `grove {}`", run_state.command);
    Ok(())
}

fn require_unfinished(paths: &StatePaths, verb: &str) -> Result<RunState> {
    let run_state = state_store::load(&paths.runstate)?.ok_or_else(|| {
        Error::user_misuse(format!("nothing to {verb}: no unfinished command"))
    })?;
    if !run_state.is_unfinished() {
        return Err(Error::user_misuse(format!(
            "nothing to {verb}: the last command finished"
        )));
    }
    Ok(run_state)
}
