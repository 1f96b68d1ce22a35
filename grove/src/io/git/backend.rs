//! Query side of the git façade.
//!
//! All reads grove plans from go through here. The verbose-branch parser is
//! pure so snapshot handling stays testable without a repository.

use std::cell::RefCell;
use std::path::PathBuf;

use tracing::{debug, instrument, warn};

use crate::core::branch::{LocalBranchName, Remote, RemoteBranchName, Sha};
use crate::core::branches::{BranchInfo, BranchesSnapshot, SyncStatus};
use crate::errors::{Error, Result};
use crate::io::git::GitRunner;

/// Name of the environment variable that overrides the origin URL in tests.
pub const REMOTE_URL_OVERRIDE: &str = "GROVE_REMOTE";

/// Worktree facts beyond branch tips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoStatus {
    pub open_changes: bool,
    pub untracked_files: bool,
    pub conflicts: bool,
    pub rebase_in_progress: bool,
    pub merge_in_progress: bool,
}

/// Read-only git queries, with a per-instance cache for remote knowledge.
#[derive(Debug)]
pub struct Backend {
    runner: GitRunner,
    remotes_cache: RefCell<Option<Vec<Remote>>>,
}

impl Backend {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner: GitRunner::new(workdir),
            remotes_cache: RefCell::new(None),
        }
    }

    pub fn runner(&self) -> &GitRunner {
        &self.runner
    }

    /// The currently checked out branch (errors on detached HEAD).
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<LocalBranchName> {
        let name = self
            .runner
            .run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if name == "HEAD" {
            warn!("detached HEAD detected");
            return Err(Error::user_misuse("cannot run on a detached HEAD"));
        }
        LocalBranchName::new(name)
    }

    /// The branch checked out before the current one (`@{-1}`), if any.
    pub fn previously_checked_out_branch(&self) -> Option<LocalBranchName> {
        let name = self
            .runner
            .run_capture(&["rev-parse", "--verify", "--abbrev-ref", "@{-1}"])
            .ok()?;
        LocalBranchName::new(name).ok()
    }

    /// Capture all branches and their tips.
    #[instrument(skip_all)]
    pub fn branches_snapshot(&self) -> Result<BranchesSnapshot> {
        let output = self.runner.run_capture(&["branch", "-vv", "--all"])?;
        let (active, branches) = parse_verbose_branches(&output)?;
        let active = match active {
            Some(active) => active,
            None => self.current_branch()?,
        };
        debug!(branch_count = branches.len(), active = %active, "captured branches snapshot");
        Ok(BranchesSnapshot { active, branches })
    }

    pub fn repo_status(&self) -> Result<RepoStatus> {
        let porcelain = self.runner.run_capture(&["status", "--porcelain"])?;
        let mut status = RepoStatus::default();
        for line in porcelain.lines() {
            if line.trim().is_empty() {
                continue;
            }
            status.open_changes = true;
            let code = &line[..line.len().min(2)];
            if code == "??" {
                status.untracked_files = true;
            }
            if is_conflict_code(code) {
                status.conflicts = true;
            }
        }
        let git_dir = self.git_dir()?;
        status.rebase_in_progress =
            git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists();
        status.merge_in_progress = git_dir.join("MERGE_HEAD").exists();
        Ok(status)
    }

    /// The configured remotes, cached per instance.
    pub fn remotes(&self) -> Result<Vec<Remote>> {
        if let Some(cached) = self.remotes_cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let output = self.runner.run_capture(&["remote"])?;
        let remotes: Vec<Remote> = output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Remote::new(line.trim()))
            .collect();
        *self.remotes_cache.borrow_mut() = Some(remotes.clone());
        Ok(remotes)
    }

    pub fn has_origin(&self) -> Result<bool> {
        Ok(self.remotes()?.contains(&Remote::origin()))
    }

    pub fn has_upstream(&self) -> Result<bool> {
        Ok(self.remotes()?.contains(&Remote::upstream()))
    }

    /// Drop cached remote knowledge. Called after `fetch`.
    pub fn invalidate_remotes_cache(&self) {
        *self.remotes_cache.borrow_mut() = None;
    }

    pub fn sha_for(&self, reference: &str) -> Result<Sha> {
        let sha = self.runner.run_capture(&["rev-parse", reference])?;
        Ok(Sha::new(sha))
    }

    pub fn branch_exists(&self, branch: &LocalBranchName) -> Result<bool> {
        self.runner.run_status(&[
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/heads/{branch}"),
        ])
    }

    /// True when `branch` holds changes not present in `parent`.
    pub fn branch_has_unmerged_changes(
        &self,
        branch: &LocalBranchName,
        parent: &LocalBranchName,
    ) -> Result<bool> {
        let range = format!("{parent}..{branch}");
        Ok(!self.runner.run_status(&["diff", "--quiet", &range])?)
    }

    pub fn root_dir(&self) -> Result<PathBuf> {
        let path = self.runner.run_capture(&["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(path))
    }

    pub fn git_dir(&self) -> Result<PathBuf> {
        let path = self.runner.run_capture(&["rev-parse", "--git-dir"])?;
        let path = PathBuf::from(path);
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.runner.workdir().join(path))
        }
    }

    pub fn stash_size(&self) -> Result<usize> {
        let output = self.runner.run_capture(&["stash", "list"])?;
        Ok(output.lines().filter(|line| !line.trim().is_empty()).count())
    }

    /// URL of the origin remote. Tests override it via `GROVE_REMOTE`.
    pub fn origin_url(&self) -> Option<String> {
        if let Ok(url) = std::env::var(REMOTE_URL_OVERRIDE) {
            if !url.is_empty() {
                return Some(url);
            }
        }
        self.runner
            .run_capture(&["remote", "get-url", "origin"])
            .ok()
            .filter(|url| !url.is_empty())
    }
}

fn is_conflict_code(code: &str) -> bool {
    matches!(code, "DD" | "AU" | "UD" | "UA" | "DU" | "AA" | "UU")
}

/// One local line of `git branch -vv --all`, before pairing with remotes.
#[derive(Debug)]
struct LocalEntry {
    name: LocalBranchName,
    sha: Sha,
    tracking: Option<(RemoteBranchName, TrackingState)>,
    other_worktree: bool,
    active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackingState {
    InSync,
    AheadOrBehind,
    Gone,
}

/// Parse `git branch -vv --all` output into branch infos.
///
/// Returns the active branch (if the checkout is not detached) and one
/// [`BranchInfo`] per local branch plus one per unpaired remote branch.
pub fn parse_verbose_branches(
    output: &str,
) -> Result<(Option<LocalBranchName>, Vec<BranchInfo>)> {
    let mut locals: Vec<LocalEntry> = Vec::new();
    let mut remotes: Vec<(RemoteBranchName, Sha)> = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (marker, rest) = line.split_at(line.len().min(2));
        let rest = rest.trim_start();
        if rest.starts_with('(') {
            // Detached HEAD line; the caller resolves the active branch.
            continue;
        }
        let mut words = rest.split_whitespace();
        let name = match words.next() {
            Some(name) => name,
            None => continue,
        };
        let sha = match words.next() {
            Some(sha) => sha,
            None => continue,
        };
        if sha == "->" {
            // Symref line like "remotes/origin/HEAD -> origin/main".
            continue;
        }
        if let Some(remote_name) = name.strip_prefix("remotes/") {
            remotes.push((RemoteBranchName::new(remote_name)?, Sha::new(sha)));
            continue;
        }
        let after_name = rest[name.len()..].trim_start();
        let tail = after_name[sha.len()..].trim_start();
        locals.push(LocalEntry {
            name: LocalBranchName::new(name)?,
            sha: Sha::new(sha),
            tracking: parse_tracking(tail)?,
            other_worktree: marker.starts_with('+'),
            active: marker.starts_with('*'),
        });
    }

    let active = locals
        .iter()
        .find(|entry| entry.active)
        .map(|entry| entry.name.clone());
    let mut branches = Vec::new();
    for entry in &locals {
        let (remote_name, remote_sha, sync_status) = match &entry.tracking {
            None => (None, None, SyncStatus::LocalOnly),
            Some((remote, state)) => {
                let remote_sha = remotes
                    .iter()
                    .find(|(name, _)| name == remote)
                    .map(|(_, sha)| sha.clone());
                let status = match state {
                    TrackingState::Gone => SyncStatus::DeletedAtRemote,
                    TrackingState::AheadOrBehind => SyncStatus::NotInSync,
                    TrackingState::InSync => {
                        if remote_sha.as_ref() == Some(&entry.sha) || remote_sha.is_none() {
                            SyncStatus::UpToDate
                        } else {
                            SyncStatus::NotInSync
                        }
                    }
                };
                (Some(remote.clone()), remote_sha, status)
            }
        };
        let sync_status = if entry.other_worktree {
            SyncStatus::OtherWorktree
        } else {
            sync_status
        };
        let remote_name = match sync_status {
            SyncStatus::DeletedAtRemote => None,
            _ => remote_name,
        };
        branches.push(BranchInfo {
            local_name: Some(entry.name.clone()),
            remote_name,
            local_sha: Some(entry.sha.clone()),
            remote_sha,
            sync_status,
        });
    }
    for (name, sha) in &remotes {
        let is_paired = locals.iter().any(|entry| {
            entry
                .tracking
                .as_ref()
                .is_some_and(|(remote, _)| remote == name)
        });
        if is_paired {
            continue;
        }
        branches.push(BranchInfo {
            local_name: None,
            remote_name: Some(name.clone()),
            local_sha: None,
            remote_sha: Some(sha.clone()),
            sync_status: SyncStatus::RemoteOnly,
        });
    }
    Ok((active, branches))
}

/// Extract the `[origin/x: ahead 1]` tracking annotation from the text that
/// follows the SHA. Bracketed text without a slash before the colon is a
/// commit message, not tracking info.
fn parse_tracking(tail: &str) -> Result<Option<(RemoteBranchName, TrackingState)>> {
    let Some(inner) = tail.strip_prefix('[').and_then(|rest| rest.split(']').next()) else {
        return Ok(None);
    };
    let (name, status) = match inner.split_once(':') {
        Some((name, status)) => (name.trim(), status.trim()),
        None => (inner.trim(), ""),
    };
    if !name.contains('/') {
        return Ok(None);
    }
    let state = if status == "gone" {
        TrackingState::Gone
    } else if status.is_empty() {
        TrackingState::InSync
    } else {
        TrackingState::AheadOrBehind
    };
    Ok(Some((RemoteBranchName::new(name)?, state)))
}
