//! Fire-and-forget execution for configuration-only commands.
//!
//! No run-state capture, no undo accumulation. Individual failures are
//! printed as notices and do not halt the loop.

use crate::vm::program::Program;
use crate::vm::RunEnv;

pub fn execute_light(program: Program, env: &mut RunEnv) {
    for opcode in program {
        if let Err(err) = opcode.run(env) {
            println!("NOTICE: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::Config;
    use crate::io::git::backend::Backend;
    use crate::io::git::frontend::DryRunFrontend;
    use crate::test_support::{local, snapshot_with_branches, TestRepo};
    use crate::vm::opcode::Opcode;

    /// A failing opcode must not stop the ones after it.
    #[test]
    fn failures_do_not_halt_the_loop() {
        let repo = TestRepo::new().expect("repo");
        repo.set_config("grove.main-branch", "main");
        let backend = Backend::new(repo.root());
        let frontend = DryRunFrontend::new();
        let mut config = Config::load(repo.root(), false).expect("config");
        let mut messages = Vec::new();
        let mut snapshot = snapshot_with_branches("main", &[("main", "111111")]);
        let mut env = RunEnv {
            backend: &backend,
            frontend: &frontend,
            config: &mut config,
            connector: None,
            messages: &mut messages,
            snapshot: &mut snapshot,
        };

        let program = Program::from(vec![
            // No connector is configured, so this fails.
            Opcode::ConnectorMergeProposal {
                branch: local("topic"),
                proposal_number: 1,
                commit_message: None,
                proposal_message: String::new(),
            },
            Opcode::QueueMessage {
                message: "still ran".to_string(),
            },
        ]);
        execute_light(program, &mut env);
        assert_eq!(messages, vec!["still ran".to_string()]);
    }
}
