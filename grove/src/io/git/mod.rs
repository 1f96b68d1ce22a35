//! Git adapter: a small, explicit wrapper around `git` subprocess calls.
//!
//! Split into a query-only [`backend::Backend`] used during planning and an
//! effectful [`frontend::Frontend`] driven by opcodes. Neither side ever
//! prompts: editor-opening commands are run with `GIT_EDITOR=true`.

pub mod backend;
pub mod frontend;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Context;
use tracing::debug;

use crate::errors::{Error, Result};

/// Executes git commands in a working directory.
#[derive(Debug, Clone)]
pub struct GitRunner {
    workdir: PathBuf,
}

impl GitRunner {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run git, requiring exit code zero. Failures carry the full command
    /// line and captured stderr.
    pub fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::VcsFailure {
                command: render_command(args),
                stderr,
            });
        }
        Ok(output)
    }

    /// Run git and return trimmed stdout.
    pub fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Run git and report only whether it succeeded.
    pub fn run_status(&self, args: &[&str]) -> Result<bool> {
        Ok(self.run(args)?.status.success())
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(command = %render_command(args), "running git");
        Command::new("git")
            .args(args)
            .env("GIT_EDITOR", "true")
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn {}", render_command(args)))
            .map_err(Error::from)
    }
}

/// Render a git invocation for error messages and dry-run output.
pub fn render_command(args: &[&str]) -> String {
    let mut text = String::from("git");
    for arg in args {
        text.push(' ');
        if arg.contains(' ') {
            text.push('"');
            text.push_str(arg);
            text.push('"');
        } else {
            text.push_str(arg);
        }
    }
    text
}
