//! The merged, effective configuration.
//!
//! Planners read only this view. The merge order is file, then global git
//! config, then local git config; later layers win per setting.

use regex::Regex;

use crate::config::partial::PartialConfig;
use crate::config::values::{HostingPlatform, SyncFeatureStrategy, SyncPerennialStrategy};
use crate::core::branch::LocalBranchName;
use crate::core::branches::BranchType;
use crate::core::lineage::Lineage;
use crate::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct FullConfig {
    pub main_branch: LocalBranchName,
    pub perennial_branches: Vec<LocalBranchName>,
    pub perennial_regex: Option<Regex>,
    pub contribution_branches: Vec<LocalBranchName>,
    pub observed_branches: Vec<LocalBranchName>,
    pub parked_branches: Vec<LocalBranchName>,
    pub push_hook: bool,
    pub push_new_branches: bool,
    pub sync_feature_strategy: SyncFeatureStrategy,
    pub sync_perennial_strategy: SyncPerennialStrategy,
    pub sync_upstream: bool,
    pub sync_before_ship: bool,
    pub ship_delete_tracking_branch: bool,
    pub offline: bool,
    pub hosting_platform: Option<HostingPlatform>,
    pub github_token: Option<String>,
    pub gitlab_token: Option<String>,
    pub gitea_token: Option<String>,
    pub lineage: Lineage,
}

impl FullConfig {
    /// Merge the three layers. Fails when no layer names a main branch.
    pub fn merge(file: &PartialConfig, global: &PartialConfig, local: &PartialConfig) -> Result<Self> {
        let layers = [file, global, local];
        let pick = |get: fn(&PartialConfig) -> Option<&LocalBranchName>| {
            layers.iter().rev().find_map(|layer| get(layer).cloned())
        };
        let main_branch = pick(|layer| layer.main_branch.as_ref()).ok_or_else(|| {
            Error::ConfigInvalid(
                "main branch is not configured; run `grove config set main-branch <name>`"
                    .to_string(),
            )
        })?;
        let perennial_regex = layers
            .iter()
            .rev()
            .find_map(|layer| layer.perennial_regex.clone())
            .map(|pattern| {
                Regex::new(&pattern).map_err(|err| {
                    Error::ConfigInvalid(format!("invalid perennial-regex {pattern:?}: {err}"))
                })
            })
            .transpose()?;
        let mut lineage = Lineage::new();
        for layer in layers {
            for (child, parent) in layer.lineage.entries() {
                lineage.set_parent(child.clone(), parent.clone());
            }
        }
        Ok(Self {
            main_branch,
            perennial_branches: merge_list(&layers, |layer| layer.perennial_branches.as_ref()),
            perennial_regex,
            contribution_branches: merge_list(&layers, |layer| {
                layer.contribution_branches.as_ref()
            }),
            observed_branches: merge_list(&layers, |layer| layer.observed_branches.as_ref()),
            parked_branches: merge_list(&layers, |layer| layer.parked_branches.as_ref()),
            push_hook: merge_flag(&layers, |layer| layer.push_hook, true),
            push_new_branches: merge_flag(&layers, |layer| layer.push_new_branches, false),
            sync_feature_strategy: layers
                .iter()
                .rev()
                .find_map(|layer| layer.sync_feature_strategy)
                .unwrap_or_default(),
            sync_perennial_strategy: layers
                .iter()
                .rev()
                .find_map(|layer| layer.sync_perennial_strategy)
                .unwrap_or_default(),
            sync_upstream: merge_flag(&layers, |layer| layer.sync_upstream, true),
            sync_before_ship: merge_flag(&layers, |layer| layer.sync_before_ship, false),
            ship_delete_tracking_branch: merge_flag(
                &layers,
                |layer| layer.ship_delete_tracking_branch,
                true,
            ),
            offline: merge_flag(&layers, |layer| layer.offline, false),
            hosting_platform: layers.iter().rev().find_map(|layer| layer.hosting_platform),
            github_token: layers
                .iter()
                .rev()
                .find_map(|layer| layer.github_token.clone()),
            gitlab_token: layers
                .iter()
                .rev()
                .find_map(|layer| layer.gitlab_token.clone()),
            gitea_token: layers
                .iter()
                .rev()
                .find_map(|layer| layer.gitea_token.clone()),
            lineage,
        })
    }

    pub fn is_main_branch(&self, branch: &LocalBranchName) -> bool {
        branch == &self.main_branch
    }

    pub fn is_perennial_branch(&self, branch: &LocalBranchName) -> bool {
        if self.perennial_branches.contains(branch) {
            return true;
        }
        self.perennial_regex
            .as_ref()
            .is_some_and(|regex| regex.is_match(branch.as_str()))
    }

    pub fn is_main_or_perennial(&self, branch: &LocalBranchName) -> bool {
        self.is_main_branch(branch) || self.is_perennial_branch(branch)
    }

    pub fn branch_type(&self, branch: &LocalBranchName) -> BranchType {
        if self.is_main_branch(branch) {
            BranchType::Main
        } else if self.is_perennial_branch(branch) {
            BranchType::Perennial
        } else if self.contribution_branches.contains(branch) {
            BranchType::Contribution
        } else if self.observed_branches.contains(branch) {
            BranchType::Observed
        } else if self.parked_branches.contains(branch) {
            BranchType::Parked
        } else {
            BranchType::Feature
        }
    }

    pub fn is_online(&self) -> bool {
        !self.offline
    }
}

fn merge_list(
    layers: &[&PartialConfig; 3],
    get: fn(&PartialConfig) -> Option<&Vec<LocalBranchName>>,
) -> Vec<LocalBranchName> {
    layers
        .iter()
        .rev()
        .find_map(|layer| get(layer).cloned())
        .unwrap_or_default()
}

fn merge_flag(
    layers: &[&PartialConfig; 3],
    get: fn(&PartialConfig) -> Option<bool>,
    default: bool,
) -> bool {
    layers
        .iter()
        .rev()
        .find_map(|layer| get(layer))
        .unwrap_or(default)
}
