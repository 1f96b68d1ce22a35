//! Effectful side of the git façade.
//!
//! Every mutation an opcode can make goes through the [`Frontend`] trait.
//! Implementors supply only [`Frontend::invoke`]; the named commands are
//! provided methods, so the shell frontend and the dry-run recorder stay in
//! lockstep. The recorder also serves tests, mirroring how scripted fakes
//! stand in for process-spawning adapters elsewhere in this codebase.

use std::cell::RefCell;
use std::path::PathBuf;

use tracing::info;

use crate::core::branch::{LocalBranchName, Remote, RemoteBranchName, Sha};
use crate::errors::Result;
use crate::io::git::{render_command, GitRunner};

pub trait Frontend {
    /// Run one git command. The only required method.
    fn invoke(&self, args: &[&str]) -> Result<()>;

    fn checkout(&self, branch: &LocalBranchName) -> Result<()> {
        self.invoke(&["checkout", branch.as_str()])
    }

    fn create_branch(&self, branch: &LocalBranchName, starting_point: &str) -> Result<()> {
        self.invoke(&["branch", branch.as_str(), starting_point])
    }

    /// Deletes with `-D`: callers invoke this for branches that are already
    /// shipped or explicitly discarded, which git's `-d` merge check would
    /// refuse after a squash merge.
    fn delete_local_branch(&self, branch: &LocalBranchName) -> Result<()> {
        self.invoke(&["branch", "-D", branch.as_str()])
    }

    fn force_delete_local_branch(&self, branch: &LocalBranchName) -> Result<()> {
        self.invoke(&["branch", "-D", branch.as_str()])
    }

    fn delete_tracking_branch(&self, branch: &RemoteBranchName) -> Result<()> {
        let remote = branch.remote();
        let target = format!(":{}", branch.local_name());
        self.invoke(&["push", remote.as_str(), &target])
    }

    fn create_tracking_branch(&self, branch: &LocalBranchName, remote: &Remote) -> Result<()> {
        self.invoke(&["push", "-u", remote.as_str(), branch.as_str()])
    }

    fn merge(&self, reference: &str) -> Result<()> {
        self.invoke(&["merge", "--no-edit", reference])
    }

    fn squash_merge(&self, branch: &LocalBranchName) -> Result<()> {
        self.invoke(&["merge", "--squash", branch.as_str()])
    }

    fn commit_with_message(&self, message: &str) -> Result<()> {
        self.invoke(&["commit", "-m", message])
    }

    fn commit_no_edit(&self) -> Result<()> {
        self.invoke(&["commit", "--no-edit"])
    }

    fn rebase(&self, reference: &str) -> Result<()> {
        self.invoke(&["rebase", reference])
    }

    fn rebase_onto(&self, onto: &str, upstream: &str) -> Result<()> {
        self.invoke(&["rebase", "--onto", onto, upstream])
    }

    fn cherry_pick(&self, sha: &Sha) -> Result<()> {
        self.invoke(&["cherry-pick", sha.as_str()])
    }

    fn reset_to_sha(&self, sha: &Sha, hard: bool) -> Result<()> {
        if hard {
            self.invoke(&["reset", "--hard", sha.as_str()])
        } else {
            self.invoke(&["reset", sha.as_str()])
        }
    }

    fn discard_open_changes(&self) -> Result<()> {
        self.invoke(&["reset", "--hard"])
    }

    /// Pushes the current branch; `_branch` names it for recording only.
    fn push(
        &self,
        _branch: &LocalBranchName,
        force_if_includes: bool,
        no_push_hook: bool,
    ) -> Result<()> {
        let mut args = vec!["push"];
        if no_push_hook {
            args.push("--no-verify");
        }
        if force_if_includes {
            args.push("--force-with-lease");
            args.push("--force-if-includes");
        }
        self.invoke(&args)
    }

    fn push_tags(&self) -> Result<()> {
        self.invoke(&["push", "--tags"])
    }

    fn pull(&self) -> Result<()> {
        self.invoke(&["pull"])
    }

    fn fetch(&self) -> Result<()> {
        self.invoke(&["fetch", "--prune", "--tags"])
    }

    fn fetch_upstream(&self, branch: &LocalBranchName) -> Result<()> {
        self.invoke(&["fetch", Remote::upstream().as_str(), branch.as_str()])
    }

    fn stash_open_changes(&self) -> Result<()> {
        self.invoke(&["add", "-A"])?;
        self.invoke(&["stash"])
    }

    fn pop_stash(&self) -> Result<()> {
        self.invoke(&["stash", "pop"])
    }

    fn commit_open_changes(&self, branch: &LocalBranchName) -> Result<()> {
        self.invoke(&["add", "-A"])?;
        let message = format!("Committing open changes on {branch}");
        self.invoke(&["commit", "-m", &message])
    }

    fn undo_last_commit(&self) -> Result<()> {
        self.invoke(&["reset", "--soft", "HEAD~1"])
    }

    fn abort_rebase(&self) -> Result<()> {
        self.invoke(&["rebase", "--abort"])
    }

    fn abort_merge(&self) -> Result<()> {
        self.invoke(&["merge", "--abort"])
    }

    fn continue_rebase(&self) -> Result<()> {
        self.invoke(&["rebase", "--continue"])
    }

    fn continue_merge(&self) -> Result<()> {
        self.invoke(&["commit", "--no-edit"])
    }

    fn set_config(&self, key: &str, value: &str, global: bool) -> Result<()> {
        if global {
            self.invoke(&["config", "--global", key, value])
        } else {
            self.invoke(&["config", key, value])
        }
    }

    fn unset_config(&self, key: &str, global: bool) -> Result<()> {
        if global {
            self.invoke(&["config", "--global", "--unset", key])
        } else {
            self.invoke(&["config", "--unset", key])
        }
    }

    fn remove_config_section(&self, section: &str) -> Result<()> {
        self.invoke(&["config", "--remove-section", section])
    }
}

/// Frontend that actually runs git.
#[derive(Debug)]
pub struct ShellFrontend {
    runner: GitRunner,
}

impl ShellFrontend {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner: GitRunner::new(workdir),
        }
    }
}

impl Frontend for ShellFrontend {
    fn invoke(&self, args: &[&str]) -> Result<()> {
        self.runner.run_checked(args)?;
        Ok(())
    }
}

/// Frontend for `--dry-run`: records and prints each command line without
/// touching the repository.
#[derive(Debug, Default)]
pub struct DryRunFrontend {
    recorded: RefCell<Vec<String>>,
}

impl DryRunFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<String> {
        self.recorded.borrow().clone()
    }
}

impl Frontend for DryRunFrontend {
    fn invoke(&self, args: &[&str]) -> Result<()> {
        let command = render_command(args);
        info!(command = %command, "dry run");
        println!("(dry-run) {command}");
        self.recorded.borrow_mut().push(command);
        Ok(())
    }
}
