//! Run state storage under `<git-dir>/grove/`.
//!
//! Two files: `runstate.json` holds a suspended (unfinished) command and is
//! deleted on successful finalization; `undo.json` holds the finished
//! command's undo data and is consumed by `grove undo`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::debug;

use crate::errors::{Error, Result};
use crate::vm::run_state::RunState;

/// Suspended state older than this triggers the stale-state dialog.
pub const STALE_AFTER_HOURS: i64 = 4;

#[derive(Debug, Clone)]
pub struct StatePaths {
    pub runstate: PathBuf,
    pub undo: PathBuf,
}

impl StatePaths {
    pub fn new(git_dir: &Path) -> Self {
        let dir = git_dir.join("grove");
        Self {
            runstate: dir.join("runstate.json"),
            undo: dir.join("undo.json"),
        }
    }
}

/// Load a persisted run state. Absent file reads as `None`; malformed
/// content (including unknown opcode tags and the pre-snapshot layout) is a
/// [`Error::CorruptRunState`].
pub fn load(path: &Path) -> Result<Option<RunState>> {
    if !path.exists() {
        return Ok(None);
    }
    debug!(path = %path.display(), "loading run state");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read run state {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents).map_err(|err| Error::CorruptRunState {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    if value.get("initialActiveBranch").is_some() {
        // Layout written by versions that predate begin snapshots. There is
        // no begin snapshot to trust, so undo data cannot be reconstructed.
        return Err(Error::CorruptRunState {
            path: path.to_path_buf(),
            reason: "file uses the obsolete initialActiveBranch layout".to_string(),
        });
    }
    let state: RunState =
        serde_json::from_value(value).map_err(|err| Error::CorruptRunState {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    debug!(command = %state.command, pending = state.run_program.len(), "run state loaded");
    Ok(Some(state))
}

/// Atomically write a run state (temp file + rename).
pub fn save(path: &Path, state: &RunState) -> Result<()> {
    debug!(path = %path.display(), command = %state.command, "writing run state");
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("run state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp run state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace run state {}", path.display()))?;
    Ok(())
}

/// Remove a persisted run state; missing files are fine.
pub fn delete(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// True when a suspended state is old enough that the user probably forgot
/// about it.
pub fn is_stale(state: &RunState, now: DateTime<Utc>) -> bool {
    match &state.unfinished_details {
        Some(details) => now - details.end_time > Duration::hours(STALE_AFTER_HOURS),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::ConfigSnapshot;
    use crate::test_support::{local, snapshot_with_branches};
    use crate::vm::opcode::Opcode;
    use crate::vm::program::Program;
    use crate::vm::run_state::UnfinishedDetails;

    fn sample_state() -> RunState {
        RunState::new(
            "sync",
            false,
            snapshot_with_branches("main", &[("main", "111111")]),
            ConfigSnapshot::default(),
            0,
            Program::from(vec![Opcode::Fetch]),
        )
    }

    /// Verifies write then load preserves the opcode sequence.
    #[test]
    fn run_state_round_trips_through_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("grove").join("runstate.json");
        let state = sample_state();

        save(&path, &state).expect("save");
        let loaded = load(&path).expect("load").expect("present");
        assert_eq!(loaded, state);
    }

    #[test]
    fn absent_file_loads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(load(&temp.path().join("missing.json")).expect("load").is_none());
    }

    #[test]
    fn unknown_opcode_tag_is_a_corrupt_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("runstate.json");
        let mut json = serde_json::to_value(sample_state()).expect("value");
        json["run_program"] = serde_json::json!([{ "type": "TeleportBranch" }]);
        let mut text = serde_json::to_string_pretty(&json).expect("serialize");
        text.push('\n');
        std::fs::write(&path, text).expect("write");

        let err = load(&path).expect_err("corrupt");
        match err {
            Error::CorruptRunState { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected CorruptRunState, got {other:?}"),
        }
    }

    #[test]
    fn legacy_layout_is_refused() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("runstate.json");
        std::fs::write(
            &path,
            r#"{ "command": "sync", "initialActiveBranch": "main" }"#,
        )
        .expect("write");

        let err = load(&path).expect_err("legacy");
        assert!(err.to_string().contains("initialActiveBranch"));
    }

    #[test]
    fn delete_tolerates_missing_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        delete(&temp.path().join("missing.json")).expect("delete");
    }

    #[test]
    fn staleness_honors_the_threshold() {
        let mut state = sample_state();
        assert!(!is_stale(&state, Utc::now()));

        state.unfinished_details = Some(UnfinishedDetails {
            can_skip: false,
            end_branch: local("topic"),
            end_time: Utc::now() - Duration::hours(STALE_AFTER_HOURS + 1),
        });
        assert!(is_stale(&state, Utc::now()));

        state.unfinished_details = Some(UnfinishedDetails {
            can_skip: false,
            end_branch: local("topic"),
            end_time: Utc::now(),
        });
        assert!(!is_stale(&state, Utc::now()));
    }
}
