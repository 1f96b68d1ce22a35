//! Typed error kinds for grove commands.
//!
//! Every failure a command can surface maps to exactly one variant here, so
//! the CLI can pick exit codes and the interpreter can tell a conflict
//! suspension apart from a fatal git failure.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The user asked for something the current repo state does not allow.
    #[error("{0}")]
    UserMisuse(String),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A git invocation exited non-zero. Carries the command line and stderr.
    #[error("`{command}` failed: {stderr}")]
    VcsFailure { command: String, stderr: String },

    /// Execution paused on a merge conflict; run state has been persisted.
    #[error("conflicts require manual resolution")]
    ConflictSuspended { can_skip: bool },

    #[error("hosting connector error: {0}")]
    ConnectorFailure(String),

    #[error("cannot parse run state file {}: {reason}\nupgrade grove or remove the file", path.display())]
    CorruptRunState { path: PathBuf, reason: String },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn user_misuse(message: impl Into<String>) -> Self {
        Self::UserMisuse(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UserMisuse(_) => crate::exit_codes::MISUSE,
            _ => crate::exit_codes::ERROR,
        }
    }
}
