//! Test-only helpers: deterministic domain values, scripted collaborators,
//! and throwaway git repositories.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::full::FullConfig;
use crate::config::partial::PartialConfig;
use crate::core::branch::{LocalBranchName, RemoteBranchName, Sha};
use crate::core::branches::{BranchInfo, BranchesSnapshot, SyncStatus};
use crate::errors::Result;
use crate::io::hosting::{Connector, Proposal};

/// A local branch name that is known to be valid.
pub fn local(name: &str) -> LocalBranchName {
    LocalBranchName::new(name).expect("valid branch name")
}

/// A local-only branch at the given SHA.
pub fn branch_info(name: &str, sha: &str) -> BranchInfo {
    BranchInfo {
        local_name: Some(local(name)),
        remote_name: None,
        local_sha: Some(Sha::new(sha)),
        remote_sha: None,
        sync_status: SyncStatus::LocalOnly,
    }
}

/// A branch with an up-to-date tracking branch at origin.
pub fn tracking_branch_info(name: &str, sha: &str) -> BranchInfo {
    BranchInfo {
        local_name: Some(local(name)),
        remote_name: Some(RemoteBranchName::new(format!("origin/{name}")).expect("remote name")),
        local_sha: Some(Sha::new(sha)),
        remote_sha: Some(Sha::new(sha)),
        sync_status: SyncStatus::UpToDate,
    }
}

/// A branch that exists only at the remote.
pub fn remote_only_info(name: &str, sha: &str) -> BranchInfo {
    BranchInfo {
        local_name: None,
        remote_name: Some(RemoteBranchName::new(format!("origin/{name}")).expect("remote name")),
        local_sha: None,
        remote_sha: Some(Sha::new(sha)),
        sync_status: SyncStatus::RemoteOnly,
    }
}

/// Snapshot from explicit branch infos.
pub fn snapshot_of(active: &str, branches: Vec<BranchInfo>) -> BranchesSnapshot {
    BranchesSnapshot {
        active: local(active),
        branches,
    }
}

/// Snapshot of local-only branches with the given active branch. The active
/// branch is added if the list does not contain it.
pub fn snapshot_with_branches(active: &str, branches: &[(&str, &str)]) -> BranchesSnapshot {
    let mut infos: Vec<BranchInfo> = branches
        .iter()
        .map(|(name, sha)| branch_info(name, sha))
        .collect();
    if !branches.iter().any(|(name, _)| *name == active) {
        infos.push(branch_info(active, "fefefe"));
    }
    BranchesSnapshot {
        active: local(active),
        branches: infos,
    }
}

/// An effective configuration with the given main branch and lineage, all
/// other settings at their defaults.
pub fn plan_config(main: &str, lineage: &[(&str, &str)]) -> FullConfig {
    let mut layer = PartialConfig::default();
    layer.main_branch = Some(local(main));
    for (child, parent) in lineage {
        layer.lineage.set_parent(local(child), local(parent));
    }
    let empty = PartialConfig::default();
    FullConfig::merge(&empty, &empty, &layer).expect("merge test config")
}

/// Connector whose answers are scripted and whose calls are recorded.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    pub proposals: Vec<Proposal>,
    pub merged: RefCell<Vec<(u64, Option<String>)>>,
    pub retargeted: RefCell<Vec<(u64, LocalBranchName)>>,
}

impl Connector for ScriptedConnector {
    fn find_proposal(
        &self,
        branch: &LocalBranchName,
        target: &LocalBranchName,
    ) -> Result<Option<Proposal>> {
        Ok(self
            .proposals
            .iter()
            .find(|proposal| &proposal.source == branch && &proposal.target == target)
            .cloned())
    }

    fn squash_merge_proposal(&self, number: u64, commit_message: Option<&str>) -> Result<()> {
        self.merged
            .borrow_mut()
            .push((number, commit_message.map(str::to_string)));
        Ok(())
    }

    fn update_proposal_target(&self, number: u64, new_target: &LocalBranchName) -> Result<()> {
        self.retargeted
            .borrow_mut()
            .push((number, new_target.clone()));
        Ok(())
    }
}

static REPO_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A throwaway git repository with an initial commit on `main`.
///
/// The directory lives under the system temp dir and is removed on drop.
#[derive(Debug)]
pub struct TestRepo {
    root: PathBuf,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let unique = format!(
            "grove-test-{}-{}",
            std::process::id(),
            REPO_COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        let root = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&root)?;
        let repo = Self { root };
        repo.git(&["init"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "user.name", "test"]);
        repo.commit_file("README.md", "hi\n", "chore: init");
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git in the repo, asserting success.
    pub fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .env("GIT_EDITOR", "true")
            .current_dir(&self.root)
            .status()
            .expect("spawn git");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Run git in the repo and capture trimmed stdout.
    pub fn git_output(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .expect("spawn git");
        assert!(output.status.success(), "git {args:?} failed");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    pub fn set_config(&self, key: &str, value: &str) {
        self.git(&["config", key, value]);
    }

    /// Read a git config value, or `None` when it is unset.
    pub fn config_value(&self, key: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["config", "--get", key])
            .current_dir(&self.root)
            .output()
            .expect("spawn git");
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn commit_file(&self, name: &str, content: &str, message: &str) {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dirs");
        }
        std::fs::write(path, content).expect("write file");
        self.git(&["add", "-A"]);
        self.git(&["commit", "-m", message]);
    }

    pub fn create_branch(&self, name: &str, starting_point: &str) {
        self.git(&["branch", name, starting_point]);
    }

    pub fn checkout(&self, name: &str) {
        self.git(&["checkout", name]);
    }

    pub fn sha_of(&self, reference: &str) -> String {
        self.git_output(&["rev-parse", reference])
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        Command::new("git")
            .args(["show-ref", "--verify", "--quiet"])
            .arg(format!("refs/heads/{name}"))
            .current_dir(&self.root)
            .status()
            .expect("spawn git")
            .success()
    }

    /// Create a bare repository under `.git` (invisible to `git status`),
    /// add it as `origin`, and push all current branches with tracking set
    /// up.
    pub fn add_origin(&self) -> PathBuf {
        let origin = self.root.join(".git").join("origin.git");
        let status = Command::new("git")
            .args(["init", "--bare"])
            .arg(&origin)
            .status()
            .expect("spawn git");
        assert!(status.success());
        self.git(&["remote", "add", "origin", origin.to_str().expect("utf8 path")]);
        self.git(&["push", "-u", "origin", "--all"]);
        origin
    }
}

impl Drop for TestRepo {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
