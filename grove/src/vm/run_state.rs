//! Persisted record of a command's pending and finished work.
//!
//! A fresh run state is created per command, mutated as opcodes complete,
//! written to disk on suspension, and deleted on successful finalization
//! (its undo data moves to a separate finished-state file).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::store::ConfigSnapshot;
use crate::core::branch::LocalBranchName;
use crate::core::branches::BranchesSnapshot;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// Populated only while a run is suspended on a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfinishedDetails {
    pub can_skip: bool,
    pub end_branch: LocalBranchName,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub command: String,
    pub dry_run: bool,
    pub begin_branches_snapshot: BranchesSnapshot,
    pub begin_config_snapshot: ConfigSnapshot,
    pub begin_stash_size: usize,
    pub run_program: Program,
    #[serde(default)]
    pub finished_program: Program,
    #[serde(default)]
    pub abort_program: Program,
    #[serde(default)]
    pub undo_program: Program,
    #[serde(default)]
    pub final_undo_program: Program,
    #[serde(default)]
    pub end_branches_snapshot: Option<BranchesSnapshot>,
    #[serde(default)]
    pub end_config_snapshot: Option<ConfigSnapshot>,
    #[serde(default)]
    pub end_stash_size: Option<usize>,
    #[serde(default)]
    pub unfinished_details: Option<UnfinishedDetails>,
    /// The opcode whose failure suspended the run, already popped from
    /// `run_program`. `continue`, `skip`, and `abort` consult it.
    #[serde(default)]
    pub failed_opcode: Option<Opcode>,
    /// Messages queued by opcodes, printed at finalization. Kept here so
    /// they survive a suspension.
    #[serde(default)]
    pub messages: Vec<String>,
}

impl RunState {
    pub fn new(
        command: impl Into<String>,
        dry_run: bool,
        begin_branches_snapshot: BranchesSnapshot,
        begin_config_snapshot: ConfigSnapshot,
        begin_stash_size: usize,
        run_program: Program,
    ) -> Self {
        Self {
            command: command.into(),
            dry_run,
            begin_branches_snapshot,
            begin_config_snapshot,
            begin_stash_size,
            run_program,
            finished_program: Program::new(),
            abort_program: Program::new(),
            undo_program: Program::new(),
            final_undo_program: Program::new(),
            end_branches_snapshot: None,
            end_config_snapshot: None,
            end_stash_size: None,
            unfinished_details: None,
            failed_opcode: None,
            messages: Vec::new(),
        }
    }

    pub fn is_unfinished(&self) -> bool {
        self.unfinished_details.is_some()
    }
}
