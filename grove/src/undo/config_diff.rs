//! Synthesize configuration undo from two config snapshots.
//!
//! Lineage entries and branch-type lists live in git config, so restoring
//! the local scope also restores the lineage. Global settings are only
//! touched by explicit `config set --global`, which runs outside full-mode
//! commands and is therefore not diffed here.

use crate::config::store::ConfigSnapshot;
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

pub fn undo_config_program(begin: &ConfigSnapshot, end: &ConfigSnapshot) -> Program {
    let mut program = Program::new();
    for (key, begin_value) in &begin.local {
        match end.local.get(key) {
            Some(end_value) if end_value == begin_value => {}
            _ => program.append(Opcode::SetLocalConfig {
                key: key.clone(),
                value: begin_value.clone(),
            }),
        }
    }
    for key in end.local.keys() {
        if !begin.local.contains_key(key) {
            program.append(Opcode::RemoveLocalConfig { key: key.clone() });
        }
    }
    program
}
