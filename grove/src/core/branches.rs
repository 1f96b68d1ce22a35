//! Branch facts captured once at command start.
//!
//! A [`BranchesSnapshot`] is a value: planners and the undo engine reason
//! about the snapshot taken when the command began, never about live repo
//! state. Only [`crate::vm::opcode::Opcode::UpdateInitialBranchLocalSHA`]
//! may amend it mid-run.

use serde::{Deserialize, Serialize};

use crate::core::branch::{LocalBranchName, RemoteBranchName, Sha};

/// How a local branch relates to its tracking branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatus {
    UpToDate,
    NotInSync,
    /// Exists locally, was never pushed.
    LocalOnly,
    /// Exists only at the remote.
    RemoteOnly,
    /// Had a tracking branch that was deleted at the remote.
    DeletedAtRemote,
    /// Checked out in another worktree; grove refuses to touch it.
    OtherWorktree,
}

/// Everything grove knows about one branch (local, remote, or both).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub local_name: Option<LocalBranchName>,
    pub remote_name: Option<RemoteBranchName>,
    pub local_sha: Option<Sha>,
    pub remote_sha: Option<Sha>,
    pub sync_status: SyncStatus,
}

impl BranchInfo {
    pub fn is_local(&self) -> bool {
        self.local_name.is_some()
    }

    /// True if the branch has a live tracking branch at the remote.
    pub fn has_tracking_branch(&self) -> bool {
        self.remote_name.is_some() && self.sync_status != SyncStatus::DeletedAtRemote
    }
}

/// Point-in-time capture of all branches plus the checked-out one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchesSnapshot {
    pub active: LocalBranchName,
    pub branches: Vec<BranchInfo>,
}

impl BranchesSnapshot {
    pub fn find_by_local_name(&self, name: &LocalBranchName) -> Option<&BranchInfo> {
        self.branches
            .iter()
            .find(|info| info.local_name.as_ref() == Some(name))
    }

    pub fn find_by_local_name_mut(&mut self, name: &LocalBranchName) -> Option<&mut BranchInfo> {
        self.branches
            .iter_mut()
            .find(|info| info.local_name.as_ref() == Some(name))
    }

    pub fn has_local_branch(&self, name: &LocalBranchName) -> bool {
        self.find_by_local_name(name).is_some()
    }

    /// True if a remote branch with this name exists without a local
    /// counterpart, i.e. creating `name` locally would collide on push.
    pub fn has_matching_tracking_branch_for(&self, name: &LocalBranchName) -> bool {
        self.branches.iter().any(|info| {
            info.local_name.is_none()
                && info
                    .remote_name
                    .as_ref()
                    .is_some_and(|remote| &remote.local_name() == name)
        })
    }

    pub fn local_branches(&self) -> impl Iterator<Item = &BranchInfo> {
        self.branches.iter().filter(|info| info.is_local())
    }
}

/// Classification of a branch, driving how commands treat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchType {
    Main,
    Perennial,
    Feature,
    Parked,
    Observed,
    Contribution,
}
