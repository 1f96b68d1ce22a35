//! Type-safe access to the grove configuration stored on disk.
//!
//! Reads happen once per command and are cached in the merged
//! [`FullConfig`]; writes go through git config and update the in-memory
//! view in the same call. Dry-run commands update only the in-memory view.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::full::FullConfig;
use crate::config::keys::{self, Key};
use crate::config::partial::PartialConfig;
use crate::core::branch::LocalBranchName;
use crate::errors::{Error, Result};
use crate::io::git::GitRunner;

/// File name of the repository-level configuration file.
pub const CONFIG_FILE_NAME: &str = "grove.toml";

/// Raw capture of all grove-owned git config entries, per scope.
/// Captured at command begin and end; the diff drives configuration undo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub global: BTreeMap<String, String>,
    pub local: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct Config {
    pub full: FullConfig,
    pub dry_run: bool,
    file: PartialConfig,
    global: PartialConfig,
    local: PartialConfig,
    runner: GitRunner,
}

impl Config {
    /// Load all three layers from `root` and merge them.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn load(root: &Path, dry_run: bool) -> Result<Self> {
        let runner = GitRunner::new(root);
        let file = load_file_layer(root)?;
        let global = load_git_layer(&runner, true)?;
        let local = load_git_layer(&runner, false)?;
        let full = FullConfig::merge(&file, &global, &local)?;
        debug!(
            main_branch = %full.main_branch,
            lineage_entries = full.lineage.len(),
            "configuration loaded"
        );
        Ok(Self {
            full,
            dry_run,
            file,
            global,
            local,
            runner,
        })
    }

    /// Like [`Config::load`], but tolerates a missing main branch by
    /// assuming the currently checked out one. `grove config set` needs
    /// this so the main branch can be configured in the first place.
    pub fn load_with_default_main(root: &Path) -> Result<Self> {
        let runner = GitRunner::new(root);
        let file = load_file_layer(root)?;
        let global = load_git_layer(&runner, true)?;
        let mut local = load_git_layer(&runner, false)?;
        if file.main_branch.is_none()
            && global.main_branch.is_none()
            && local.main_branch.is_none()
        {
            let head = runner
                .run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])
                .ok()
                .and_then(|head| LocalBranchName::new(head).ok())
                .unwrap_or_else(|| LocalBranchName::new("main").expect("valid name"));
            local.main_branch = Some(head);
        }
        let full = FullConfig::merge(&file, &global, &local)?;
        Ok(Self {
            full,
            dry_run: false,
            file,
            global,
            local,
            runner,
        })
    }

    /// Capture the raw grove-owned entries for undo diffing.
    pub fn snapshot(&self) -> Result<ConfigSnapshot> {
        Ok(ConfigSnapshot {
            global: raw_grove_entries(&self.runner, true)?,
            local: raw_grove_entries(&self.runner, false)?,
        })
    }

    /// Record `parent` as the lineage parent of `child`.
    pub fn set_parent(&mut self, child: &LocalBranchName, parent: &LocalBranchName) -> Result<()> {
        self.write_local(&keys::lineage_key(child), parent.as_str())?;
        self.local
            .lineage
            .set_parent(child.clone(), parent.clone());
        self.full
            .lineage
            .set_parent(child.clone(), parent.clone());
        Ok(())
    }

    /// Drop the lineage entry of `child`.
    pub fn remove_parent(&mut self, child: &LocalBranchName) -> Result<()> {
        self.unset_local(&keys::lineage_key(child))?;
        self.local.lineage.remove(child);
        self.full.lineage.remove(child);
        Ok(())
    }

    /// Set one typed setting in the given scope and refresh the merged view.
    pub fn set_key(&mut self, key: Key, value: &str, global: bool) -> Result<()> {
        let layer = if global {
            &mut self.global
        } else {
            &mut self.local
        };
        layer.add(key, value)?;
        if global {
            self.write_global(key.as_str(), value)?;
        } else {
            self.write_local(key.as_str(), value)?;
        }
        self.remerge()
    }

    /// Raw local write used by configuration-undo opcodes. The value is
    /// validated when it targets a recognized key.
    pub fn set_raw_local(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(child) = keys::parse_lineage_key(key) {
            return self.set_parent(&child, &LocalBranchName::new(value)?);
        }
        if let Some(known) = Key::parse(key) {
            return self.set_key(known, value, false);
        }
        self.write_local(key, value)
    }

    /// Raw local removal used by configuration-undo opcodes.
    pub fn remove_raw_local(&mut self, key: &str) -> Result<()> {
        if let Some(child) = keys::parse_lineage_key(key) {
            return self.remove_parent(&child);
        }
        self.unset_local(key)?;
        if Key::parse(key).is_some() {
            self.local = load_git_layer(&self.runner, false)?;
            self.remerge()?;
        }
        Ok(())
    }

    /// Drop one branch from a branch-list setting in the local scope.
    pub fn remove_from_branch_list(
        &mut self,
        key: Key,
        branch: &LocalBranchName,
    ) -> Result<()> {
        let current = match key {
            Key::PerennialBranches => &self.full.perennial_branches,
            Key::ContributionBranches => &self.full.contribution_branches,
            Key::ObservedBranches => &self.full.observed_branches,
            Key::ParkedBranches => &self.full.parked_branches,
            other => {
                return Err(Error::InternalInvariant(format!(
                    "{} is not a branch list",
                    other.as_str()
                )));
            }
        };
        let filtered: Vec<LocalBranchName> = current
            .iter()
            .filter(|name| *name != branch)
            .cloned()
            .collect();
        self.set_key(key, &crate::config::partial::render_branch_list(&filtered), false)
    }

    /// Remove every grove setting from the local git config.
    /// Missing sections are not an error.
    pub fn remove_all(&mut self) -> Result<()> {
        if !self.dry_run {
            let _ = self
                .runner
                .run_status(&["config", "--remove-section", keys::CONFIG_SECTION]);
            let lineage = self.local.lineage.clone();
            for (child, _) in lineage.entries() {
                let _ = self.runner.run_status(&[
                    "config",
                    "--remove-section",
                    &format!("{}.{child}", keys::LINEAGE_SECTION),
                ]);
            }
        }
        self.local = PartialConfig::default();
        match FullConfig::merge(&self.file, &self.global, &self.local) {
            Ok(full) => self.full = full,
            Err(Error::ConfigInvalid(_)) => {
                // The main branch was part of the removed scope; keep the
                // previous one in memory so this instance stays usable.
                let mut fallback = PartialConfig::default();
                fallback.main_branch = Some(self.full.main_branch.clone());
                self.full = FullConfig::merge(&self.file, &self.global, &fallback)?;
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn remerge(&mut self) -> Result<()> {
        self.full = FullConfig::merge(&self.file, &self.global, &self.local)?;
        Ok(())
    }

    fn write_local(&self, key: &str, value: &str) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        self.runner.run_checked(&["config", key, value])?;
        Ok(())
    }

    fn write_global(&self, key: &str, value: &str) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        self.runner
            .run_checked(&["config", "--global", key, value])?;
        Ok(())
    }

    fn unset_local(&self, key: &str) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        // Unsetting a key that is already gone is fine.
        let _ = self.runner.run_status(&["config", "--unset", key]);
        Ok(())
    }

    /// Render the effective settings for `grove config`.
    pub fn describe(&self) -> Vec<(String, String)> {
        let full = &self.full;
        let mut rows = vec![
            (
                Key::MainBranch.short_name().to_string(),
                full.main_branch.to_string(),
            ),
            (
                Key::PerennialBranches.short_name().to_string(),
                crate::config::partial::render_branch_list(&full.perennial_branches),
            ),
            (
                Key::SyncFeatureStrategy.short_name().to_string(),
                full.sync_feature_strategy.to_string(),
            ),
            (
                Key::SyncPerennialStrategy.short_name().to_string(),
                full.sync_perennial_strategy.to_string(),
            ),
            (
                Key::PushHook.short_name().to_string(),
                full.push_hook.to_string(),
            ),
            (
                Key::PushNewBranches.short_name().to_string(),
                full.push_new_branches.to_string(),
            ),
            (
                Key::SyncUpstream.short_name().to_string(),
                full.sync_upstream.to_string(),
            ),
            (
                Key::SyncBeforeShip.short_name().to_string(),
                full.sync_before_ship.to_string(),
            ),
            (
                Key::ShipDeleteTrackingBranch.short_name().to_string(),
                full.ship_delete_tracking_branch.to_string(),
            ),
            (
                Key::Offline.short_name().to_string(),
                full.offline.to_string(),
            ),
        ];
        if let Some(regex) = &full.perennial_regex {
            rows.push((
                Key::PerennialRegex.short_name().to_string(),
                regex.as_str().to_string(),
            ));
        }
        if let Some(platform) = full.hosting_platform {
            rows.push((
                Key::HostingPlatform.short_name().to_string(),
                platform.to_string(),
            ));
        }
        rows
    }

    /// Current value of a key as text, for `grove config get`.
    pub fn get_text(&self, key: Key) -> Option<String> {
        self.describe()
            .into_iter()
            .find(|(name, _)| name == key.short_name())
            .map(|(_, value)| value)
            .or_else(|| match key {
                Key::GithubToken => self.full.github_token.clone(),
                Key::GitlabToken => self.full.gitlab_token.clone(),
                Key::GiteaToken => self.full.gitea_token.clone(),
                _ => None,
            })
    }
}

fn load_file_layer(root: &Path) -> Result<PartialConfig> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(PartialConfig::default());
    }
    let text = std::fs::read_to_string(&path)?;
    PartialConfig::from_toml(&text)
}

fn load_git_layer(runner: &GitRunner, global: bool) -> Result<PartialConfig> {
    let output = read_git_config(runner, global);
    PartialConfig::from_git_output(&output)
}

/// `git config -lz` for the scope; a missing config file reads as empty.
fn read_git_config(runner: &GitRunner, global: bool) -> String {
    let scope = if global { "--global" } else { "--local" };
    runner
        .run_checked(&["config", "-lz", scope])
        .map(|output| String::from_utf8_lossy(&output.stdout).to_string())
        .unwrap_or_default()
}

fn raw_grove_entries(runner: &GitRunner, global: bool) -> Result<BTreeMap<String, String>> {
    let output = read_git_config(runner, global);
    let mut entries = BTreeMap::new();
    for entry in output.split('\0') {
        if entry.is_empty() {
            continue;
        }
        let (key, value) = match entry.split_once('\n') {
            Some(pair) => pair,
            None => (entry, ""),
        };
        if keys::is_grove_key(key) {
            entries.insert(key.to_string(), value.to_string());
        }
    }
    Ok(entries)
}
