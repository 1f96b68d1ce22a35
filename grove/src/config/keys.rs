//! The recognized configuration keys.
//!
//! All settings live under the `grove.*` namespace of git's local and global
//! configuration; lineage entries are stored as
//! `grove-branch.<child>.parent = <parent>`.

use crate::core::branch::LocalBranchName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    MainBranch,
    PerennialBranches,
    PerennialRegex,
    ContributionBranches,
    ObservedBranches,
    ParkedBranches,
    PushHook,
    PushNewBranches,
    SyncFeatureStrategy,
    SyncPerennialStrategy,
    SyncUpstream,
    SyncBeforeShip,
    ShipDeleteTrackingBranch,
    Offline,
    HostingPlatform,
    GithubToken,
    GitlabToken,
    GiteaToken,
}

pub const ALL_KEYS: [Key; 18] = [
    Key::MainBranch,
    Key::PerennialBranches,
    Key::PerennialRegex,
    Key::ContributionBranches,
    Key::ObservedBranches,
    Key::ParkedBranches,
    Key::PushHook,
    Key::PushNewBranches,
    Key::SyncFeatureStrategy,
    Key::SyncPerennialStrategy,
    Key::SyncUpstream,
    Key::SyncBeforeShip,
    Key::ShipDeleteTrackingBranch,
    Key::Offline,
    Key::HostingPlatform,
    Key::GithubToken,
    Key::GitlabToken,
    Key::GiteaToken,
];

impl Key {
    /// The full git config key, including the `grove.` section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::MainBranch => "grove.main-branch",
            Key::PerennialBranches => "grove.perennial-branches",
            Key::PerennialRegex => "grove.perennial-regex",
            Key::ContributionBranches => "grove.contribution-branches",
            Key::ObservedBranches => "grove.observed-branches",
            Key::ParkedBranches => "grove.parked-branches",
            Key::PushHook => "grove.push-hook",
            Key::PushNewBranches => "grove.push-new-branches",
            Key::SyncFeatureStrategy => "grove.sync-feature-strategy",
            Key::SyncPerennialStrategy => "grove.sync-perennial-strategy",
            Key::SyncUpstream => "grove.sync-upstream",
            Key::SyncBeforeShip => "grove.sync-before-ship",
            Key::ShipDeleteTrackingBranch => "grove.ship-delete-tracking-branch",
            Key::Offline => "grove.offline",
            Key::HostingPlatform => "grove.hosting-platform",
            Key::GithubToken => "grove.github-token",
            Key::GitlabToken => "grove.gitlab-token",
            Key::GiteaToken => "grove.gitea-token",
        }
    }

    /// The key without the `grove.` section prefix, as used on the CLI.
    pub fn short_name(&self) -> &'static str {
        self.as_str().trim_start_matches("grove.")
    }

    /// Parse a full `grove.*` key.
    pub fn parse(text: &str) -> Option<Key> {
        ALL_KEYS.into_iter().find(|key| key.as_str() == text)
    }

    /// Parse the short, section-less spelling used by `grove config`.
    pub fn parse_short(text: &str) -> Option<Key> {
        ALL_KEYS.into_iter().find(|key| key.short_name() == text)
    }
}

pub const CONFIG_SECTION: &str = "grove";
pub const LINEAGE_SECTION: &str = "grove-branch";

/// The git config key holding the parent of `child`.
pub fn lineage_key(child: &LocalBranchName) -> String {
    format!("{LINEAGE_SECTION}.{child}.parent")
}

/// Extract the child branch from a lineage key, if it is one.
pub fn parse_lineage_key(key: &str) -> Option<LocalBranchName> {
    let rest = key.strip_prefix("grove-branch.")?;
    let child = rest.strip_suffix(".parent")?;
    LocalBranchName::new(child).ok()
}

/// True for any key grove owns, recognized or not.
pub fn is_grove_key(key: &str) -> bool {
    key.starts_with("grove.") || key.starts_with("grove-branch.")
}
