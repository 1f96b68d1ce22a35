//! The program VM: typed opcodes, the programs that sequence them, the
//! persisted run state, and the interpreters that drive execution.

pub mod interpreter;
pub mod light;
pub mod opcode;
pub mod program;
pub mod run_state;

use crate::config::store::Config;
use crate::core::branches::BranchesSnapshot;
use crate::io::git::backend::Backend;
use crate::io::git::frontend::Frontend;
use crate::io::hosting::Connector;

/// Everything an opcode may touch while running.
///
/// `snapshot` is the begin snapshot of the current command; only
/// [`opcode::Opcode::UpdateInitialBranchLocalSHA`] amends it.
pub struct RunEnv<'a> {
    pub backend: &'a Backend,
    pub frontend: &'a dyn Frontend,
    pub config: &'a mut Config,
    pub connector: Option<&'a dyn Connector>,
    pub messages: &'a mut Vec<String>,
    pub snapshot: &'a mut BranchesSnapshot,
}

/// The collaborators an interpreter drives a program with.
pub struct VmContext<'a> {
    pub backend: &'a Backend,
    pub frontend: &'a dyn Frontend,
    pub config: &'a mut Config,
    pub connector: Option<&'a dyn Connector>,
}
