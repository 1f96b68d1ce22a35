//! Branch name and object id newtypes.
//!
//! These are the vocabulary of every planner and opcode. They must stay cheap
//! to clone and deterministic to order, because programs, snapshots, and the
//! lineage all key on them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Name of a branch in the local repository (no remote prefix).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalBranchName(String);

impl LocalBranchName {
    /// Trailing whitespace is trimmed; empty or space-containing names are
    /// rejected.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim_end();
        if name.is_empty() {
            return Err(Error::user_misuse("branch name must not be empty"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::user_misuse(format!(
                "branch name {name:?} must not contain whitespace"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The matching branch name at the given remote.
    pub fn at_remote(&self, remote: &Remote) -> RemoteBranchName {
        RemoteBranchName(format!("{}/{}", remote.as_str(), self.0))
    }
}

impl fmt::Display for LocalBranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a branch at a remote, in `<remote>/<branch>` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteBranchName(String);

impl RemoteBranchName {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim_end();
        if name.is_empty() {
            return Err(Error::user_misuse("remote branch name must not be empty"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::user_misuse(format!(
                "remote branch name {name:?} must not contain whitespace"
            )));
        }
        if !name.contains('/') {
            return Err(Error::user_misuse(format!(
                "remote branch name {name:?} must have the form <remote>/<branch>"
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The remote this branch lives at (the part before the first slash).
    pub fn remote(&self) -> Remote {
        let remote = self.0.split('/').next().unwrap_or_default();
        Remote(remote.to_string())
    }

    /// The branch name without the remote prefix.
    pub fn local_name(&self) -> LocalBranchName {
        let local = self.0.splitn(2, '/').nth(1).unwrap_or_default();
        LocalBranchName(local.to_string())
    }
}

impl fmt::Display for RemoteBranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A git remote name (`origin`, `upstream`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Remote(String);

impl Remote {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn origin() -> Self {
        Self("origin".to_string())
    }

    pub fn upstream() -> Self {
        Self("upstream".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A git object id, as printed by the porcelain commands grove parses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha(String);

impl Sha {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
