//! The trailing wrap segment every planner appends.
//!
//! It carries open changes across the command via the stash, and restores
//! the user's checkout history so `git checkout -` still works afterwards.

use crate::core::branch::LocalBranchName;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    pub stash_open_changes: bool,
    pub previous_branch_candidates: Vec<LocalBranchName>,
}

pub fn wrap(program: &mut Program, options: WrapOptions) {
    if program.is_empty() {
        return;
    }
    let mut candidates = options.previous_branch_candidates;
    candidates.dedup();
    if !candidates.is_empty() {
        program.append(Opcode::PreserveCheckoutHistory {
            previous_branch_candidates: candidates,
        });
    }
    if options.stash_open_changes {
        program.prepend(Opcode::StashOpenChanges);
        program.append(Opcode::RestoreOpenChanges);
    }
}
