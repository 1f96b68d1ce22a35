//! Bounded-enum configuration values.
//!
//! Settings with a closed set of legal values parse here, with a specific
//! message naming the key and the offending text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// How feature branches absorb their parents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncFeatureStrategy {
    #[default]
    Merge,
    Rebase,
}

impl SyncFeatureStrategy {
    pub fn parse(text: &str) -> Result<Self> {
        match text.to_lowercase().as_str() {
            "merge" | "" => Ok(Self::Merge),
            "rebase" => Ok(Self::Rebase),
            other => Err(Error::ConfigInvalid(format!(
                "unknown sync-feature-strategy {other:?} (expected \"merge\" or \"rebase\")"
            ))),
        }
    }
}

impl fmt::Display for SyncFeatureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => f.write_str("merge"),
            Self::Rebase => f.write_str("rebase"),
        }
    }
}

/// How perennial branches absorb upstream changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPerennialStrategy {
    Merge,
    #[default]
    Rebase,
}

impl SyncPerennialStrategy {
    pub fn parse(text: &str) -> Result<Self> {
        match text.to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "rebase" | "" => Ok(Self::Rebase),
            other => Err(Error::ConfigInvalid(format!(
                "unknown sync-perennial-strategy {other:?} (expected \"merge\" or \"rebase\")"
            ))),
        }
    }
}

impl fmt::Display for SyncPerennialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => f.write_str("merge"),
            Self::Rebase => f.write_str("rebase"),
        }
    }
}

/// Hosting platform running the origin remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostingPlatform {
    Github,
    Gitlab,
    Gitea,
    Bitbucket,
}

impl HostingPlatform {
    pub fn parse(text: &str) -> Result<Self> {
        match text.to_lowercase().as_str() {
            "github" => Ok(Self::Github),
            "gitlab" => Ok(Self::Gitlab),
            "gitea" => Ok(Self::Gitea),
            "bitbucket" => Ok(Self::Bitbucket),
            other => Err(Error::ConfigInvalid(format!(
                "unknown hosting-platform {other:?} (expected github, gitlab, gitea, or bitbucket)"
            ))),
        }
    }
}

impl fmt::Display for HostingPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Github => f.write_str("github"),
            Self::Gitlab => f.write_str("gitlab"),
            Self::Gitea => f.write_str("gitea"),
            Self::Bitbucket => f.write_str("bitbucket"),
        }
    }
}

/// Parse a git-style boolean setting.
pub fn parse_bool(key: &str, text: &str) -> Result<bool> {
    match text.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(Error::ConfigInvalid(format!(
            "invalid boolean {other:?} for {key}"
        ))),
    }
}
