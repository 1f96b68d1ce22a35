//! `grove continue`, `skip`, `abort`, and `undo`: the resume entries of a
//! suspended or finished command.

use std::path::Path;

use crate::config::store::Config;
use crate::errors::{Error, Result};
use crate::io::git::backend::Backend;
use crate::io::git::frontend::ShellFrontend;
use crate::io::state_store::StatePaths;
use crate::vm::interpreter;
use crate::vm::VmContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    Continue,
    Skip,
    Abort,
    Undo,
}

pub fn run(dir: &Path, action: ResumeAction) -> Result<()> {
    let probe = Backend::new(dir);
    let root = probe
        .root_dir()
        .map_err(|_| Error::user_misuse("not inside a git repository"))?;
    let backend = Backend::new(&root);
    let paths = StatePaths::new(&backend.git_dir()?);
    let mut config = Config::load(&root, false)?;
    let frontend = ShellFrontend::new(&root);
    let mut vm = VmContext {
        backend: &backend,
        frontend: &frontend,
        config: &mut config,
        connector: None,
    };
    match action {
        ResumeAction::Continue => interpreter::continue_run(&mut vm, &paths),
        ResumeAction::Skip => interpreter::skip_run(&mut vm, &paths),
        ResumeAction::Abort => interpreter::abort_run(&mut vm, &paths),
        ResumeAction::Undo => interpreter::undo_run(&mut vm, &paths),
    }
}
