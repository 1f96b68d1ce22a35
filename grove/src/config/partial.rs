//! One layer of configuration: the file, the global git config, or the
//! local git config. Layers are merged into a
//! [`crate::config::full::FullConfig`] at command start.

use serde::Deserialize;
use tracing::warn;

use crate::config::keys::{self, Key};
use crate::config::values::{
    parse_bool, HostingPlatform, SyncFeatureStrategy, SyncPerennialStrategy,
};
use crate::core::branch::LocalBranchName;
use crate::core::lineage::Lineage;
use crate::errors::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialConfig {
    pub main_branch: Option<LocalBranchName>,
    pub perennial_branches: Option<Vec<LocalBranchName>>,
    pub perennial_regex: Option<String>,
    pub contribution_branches: Option<Vec<LocalBranchName>>,
    pub observed_branches: Option<Vec<LocalBranchName>>,
    pub parked_branches: Option<Vec<LocalBranchName>>,
    pub push_hook: Option<bool>,
    pub push_new_branches: Option<bool>,
    pub sync_feature_strategy: Option<SyncFeatureStrategy>,
    pub sync_perennial_strategy: Option<SyncPerennialStrategy>,
    pub sync_upstream: Option<bool>,
    pub sync_before_ship: Option<bool>,
    pub ship_delete_tracking_branch: Option<bool>,
    pub offline: Option<bool>,
    pub hosting_platform: Option<HostingPlatform>,
    pub github_token: Option<String>,
    pub gitlab_token: Option<String>,
    pub gitea_token: Option<String>,
    pub lineage: Lineage,
}

impl PartialConfig {
    /// Record one `grove.*` setting. The value text is validated against the
    /// key's type.
    pub fn add(&mut self, key: Key, value: &str) -> Result<()> {
        match key {
            Key::MainBranch => self.main_branch = Some(LocalBranchName::new(value)?),
            Key::PerennialBranches => self.perennial_branches = Some(parse_branch_list(value)?),
            Key::PerennialRegex => self.perennial_regex = Some(value.to_string()),
            Key::ContributionBranches => {
                self.contribution_branches = Some(parse_branch_list(value)?)
            }
            Key::ObservedBranches => self.observed_branches = Some(parse_branch_list(value)?),
            Key::ParkedBranches => self.parked_branches = Some(parse_branch_list(value)?),
            Key::PushHook => self.push_hook = Some(parse_bool(key.as_str(), value)?),
            Key::PushNewBranches => {
                self.push_new_branches = Some(parse_bool(key.as_str(), value)?)
            }
            Key::SyncFeatureStrategy => {
                self.sync_feature_strategy = Some(SyncFeatureStrategy::parse(value)?)
            }
            Key::SyncPerennialStrategy => {
                self.sync_perennial_strategy = Some(SyncPerennialStrategy::parse(value)?)
            }
            Key::SyncUpstream => self.sync_upstream = Some(parse_bool(key.as_str(), value)?),
            Key::SyncBeforeShip => self.sync_before_ship = Some(parse_bool(key.as_str(), value)?),
            Key::ShipDeleteTrackingBranch => {
                self.ship_delete_tracking_branch = Some(parse_bool(key.as_str(), value)?)
            }
            Key::Offline => self.offline = Some(parse_bool(key.as_str(), value)?),
            Key::HostingPlatform => {
                self.hosting_platform = Some(HostingPlatform::parse(value)?)
            }
            Key::GithubToken => self.github_token = Some(value.to_string()),
            Key::GitlabToken => self.gitlab_token = Some(value.to_string()),
            Key::GiteaToken => self.gitea_token = Some(value.to_string()),
        }
        Ok(())
    }

    /// Parse the NUL-separated output of `git config -lz`.
    ///
    /// Unknown `grove.*` keys are warned about and skipped; keys outside the
    /// grove namespaces are ignored silently.
    pub fn from_git_output(output: &str) -> Result<Self> {
        let mut config = Self::default();
        for entry in output.split('\0') {
            if entry.is_empty() {
                continue;
            }
            let (key, value) = match entry.split_once('\n') {
                Some(pair) => pair,
                None => (entry, ""),
            };
            if let Some(child) = keys::parse_lineage_key(key) {
                config.lineage.set_parent(child, LocalBranchName::new(value)?);
                continue;
            }
            if !keys::is_grove_key(key) {
                continue;
            }
            match Key::parse(key) {
                Some(known) => config.add(known, value)?,
                None => warn!(key, "ignoring unknown configuration key"),
            }
        }
        Ok(config)
    }

    /// Parse the `grove.toml` configuration file.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(text)
            .map_err(|err| crate::errors::Error::ConfigInvalid(format!("grove.toml: {err}")))?;
        file.into_partial()
    }
}

/// Shape of `grove.toml`. String-typed enum settings are validated after
/// deserialization so file and git config report identical messages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct FileConfig {
    main_branch: Option<String>,
    perennial_branches: Option<Vec<String>>,
    perennial_regex: Option<String>,
    contribution_branches: Option<Vec<String>>,
    observed_branches: Option<Vec<String>>,
    parked_branches: Option<Vec<String>>,
    push_hook: Option<bool>,
    push_new_branches: Option<bool>,
    sync_feature_strategy: Option<String>,
    sync_perennial_strategy: Option<String>,
    sync_upstream: Option<bool>,
    sync_before_ship: Option<bool>,
    ship_delete_tracking_branch: Option<bool>,
    offline: Option<bool>,
    hosting_platform: Option<String>,
}

impl FileConfig {
    fn into_partial(self) -> Result<PartialConfig> {
        let mut config = PartialConfig::default();
        if let Some(name) = self.main_branch {
            config.main_branch = Some(LocalBranchName::new(name)?);
        }
        config.perennial_branches = branch_names(self.perennial_branches)?;
        config.perennial_regex = self.perennial_regex;
        config.contribution_branches = branch_names(self.contribution_branches)?;
        config.observed_branches = branch_names(self.observed_branches)?;
        config.parked_branches = branch_names(self.parked_branches)?;
        config.push_hook = self.push_hook;
        config.push_new_branches = self.push_new_branches;
        if let Some(text) = self.sync_feature_strategy {
            config.sync_feature_strategy = Some(SyncFeatureStrategy::parse(&text)?);
        }
        if let Some(text) = self.sync_perennial_strategy {
            config.sync_perennial_strategy = Some(SyncPerennialStrategy::parse(&text)?);
        }
        config.sync_upstream = self.sync_upstream;
        config.sync_before_ship = self.sync_before_ship;
        config.ship_delete_tracking_branch = self.ship_delete_tracking_branch;
        config.offline = self.offline;
        if let Some(text) = self.hosting_platform {
            config.hosting_platform = Some(HostingPlatform::parse(&text)?);
        }
        Ok(config)
    }
}

fn branch_names(names: Option<Vec<String>>) -> Result<Option<Vec<LocalBranchName>>> {
    match names {
        None => Ok(None),
        Some(names) => Ok(Some(
            names
                .into_iter()
                .map(LocalBranchName::new)
                .collect::<Result<Vec<_>>>()?,
        )),
    }
}

/// Branch lists in git config are stored space-separated.
fn parse_branch_list(value: &str) -> Result<Vec<LocalBranchName>> {
    value
        .split_whitespace()
        .map(LocalBranchName::new)
        .collect()
}

/// Serialize a branch list for storage in git config.
pub fn render_branch_list(branches: &[LocalBranchName]) -> String {
    branches
        .iter()
        .map(|branch| branch.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::local;

    #[test]
    fn parses_git_config_output() {
        let output = "grove.main-branch\nmain\0grove.offline\ntrue\0\
                      grove.perennial-branches\nstaging production\0\
                      grove-branch.topic.parent\nmain\0user.name\nalice\0";
        let config = PartialConfig::from_git_output(output).expect("parse");
        assert_eq!(config.main_branch, Some(local("main")));
        assert_eq!(config.offline, Some(true));
        assert_eq!(
            config.perennial_branches,
            Some(vec![local("staging"), local("production")])
        );
        assert_eq!(config.lineage.parent(&local("topic")), Some(&local("main")));
    }

    #[test]
    fn unknown_grove_key_is_skipped() {
        let output = "grove.does-not-exist\nx\0grove.main-branch\nmain\0";
        let config = PartialConfig::from_git_output(output).expect("parse");
        assert_eq!(config.main_branch, Some(local("main")));
    }

    #[test]
    fn invalid_value_reports_config_error() {
        let output = "grove.sync-feature-strategy\ncherry\0";
        let err = PartialConfig::from_git_output(output).unwrap_err();
        assert!(err.to_string().contains("cherry"));
    }

    #[test]
    fn parses_toml_file() {
        let text = r#"
            main-branch = "main"
            perennial-branches = ["staging"]
            sync-feature-strategy = "rebase"
            push-new-branches = true
        "#;
        let config = PartialConfig::from_toml(text).expect("parse");
        assert_eq!(config.main_branch, Some(local("main")));
        assert_eq!(config.perennial_branches, Some(vec![local("staging")]));
        assert_eq!(
            config.sync_feature_strategy,
            Some(SyncFeatureStrategy::Rebase)
        );
        assert_eq!(config.push_new_branches, Some(true));
    }

    #[test]
    fn branch_list_round_trips() {
        let branches = vec![local("staging"), local("production")];
        let rendered = render_branch_list(&branches);
        assert_eq!(parse_branch_list(&rendered).expect("parse"), branches);
    }
}
