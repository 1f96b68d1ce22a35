//! End-to-end command tests against throwaway git repositories.
//!
//! These drive the real planners, interpreter, and shell frontend. Repos
//! have no network remotes; "origin" is a bare repository inside the test
//! directory, so push and fetch behave without leaving the machine.

use grove::cmd;
use grove::cmd::resume::ResumeAction;
use grove::errors::Error;
use grove::io::dialog::QueueDialog;
use grove::io::git::backend::Backend;
use grove::io::state_store::{self, StatePaths};
use grove::test_support::TestRepo;

fn dialog() -> QueueDialog {
    QueueDialog::new(Vec::new())
}

fn state_paths(repo: &TestRepo) -> StatePaths {
    let backend = Backend::new(repo.root());
    StatePaths::new(&backend.git_dir().expect("git dir"))
}

fn current_branch(repo: &TestRepo) -> String {
    repo.git_output(&["rev-parse", "--abbrev-ref", "HEAD"])
}

/// `grove hack feature-a` on a fresh repo: creates the branch off main,
/// checks it out, records the lineage, and leaves no pending run state.
#[test]
fn hack_creates_branch_lineage_and_cleans_up() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");

    cmd::hack::run(repo.root(), Some("feature-a".to_string()), false, &mut dialog())
        .expect("hack");

    assert!(repo.branch_exists("feature-a"));
    assert_eq!(current_branch(&repo), "feature-a");
    assert_eq!(
        repo.config_value("grove-branch.feature-a.parent"),
        Some("main".to_string())
    );
    let paths = state_paths(&repo);
    assert!(!paths.runstate.exists());
    assert!(paths.undo.exists());
}

/// Open changes ride along onto the new branch.
#[test]
fn hack_carries_open_changes_to_the_new_branch() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    std::fs::write(repo.root().join("wip.txt"), "in progress\n").expect("write");

    cmd::hack::run(repo.root(), Some("feature-a".to_string()), false, &mut dialog())
        .expect("hack");

    assert_eq!(current_branch(&repo), "feature-a");
    assert!(repo.root().join("wip.txt").exists());
    let status = repo.git_output(&["status", "--porcelain"]);
    assert!(status.contains("wip.txt"), "changes still open: {status}");
}

/// Dry run: the program is printed, nothing happens, no state is written.
#[test]
fn hack_dry_run_touches_nothing() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");

    cmd::hack::run(repo.root(), Some("feature-a".to_string()), true, &mut dialog())
        .expect("hack dry run");

    assert!(!repo.branch_exists("feature-a"));
    assert_eq!(current_branch(&repo), "main");
    assert_eq!(repo.config_value("grove-branch.feature-a.parent"), None);
    let paths = state_paths(&repo);
    assert!(!paths.runstate.exists());
    assert!(!paths.undo.exists());
}

/// `grove hack` without arguments promotes a parked branch to a feature
/// branch.
#[test]
fn hack_promotes_parked_branch() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    repo.create_branch("parked-work", "main");
    repo.checkout("parked-work");
    repo.set_config("grove.parked-branches", "parked-work");

    cmd::hack::run(repo.root(), None, false, &mut dialog()).expect("promote");

    assert_eq!(repo.config_value("grove.parked-branches"), Some(String::new()));
}

fn conflict_repo() -> TestRepo {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    repo.commit_file("file.txt", "base\n", "feat: base");
    repo.create_branch("feature-a", "main");
    repo.checkout("feature-a");
    repo.commit_file("file.txt", "feature change\n", "feat: feature side");
    repo.checkout("main");
    repo.commit_file("file.txt", "main change\n", "feat: main side");
    repo.set_config("grove-branch.feature-a.parent", "main");
    repo.checkout("feature-a");
    repo
}

/// A sync that hits a merge conflict suspends: the run state is persisted
/// with the failed opcode and the pending program, and loading it twice
/// yields the same document.
#[test]
fn sync_conflict_suspends_and_persists_run_state() {
    let repo = conflict_repo();

    let err = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("conflict");
    assert!(matches!(err, Error::ConflictSuspended { can_skip: true }));

    let paths = state_paths(&repo);
    let state = state_store::load(&paths.runstate)
        .expect("load")
        .expect("present");
    assert!(state.is_unfinished());
    assert_eq!(state.command, "sync");
    assert_eq!(
        state.failed_opcode.as_ref().map(|op| op.name()),
        Some("MergeParent")
    );
    let again = state_store::load(&paths.runstate)
        .expect("reload")
        .expect("present");
    assert_eq!(state, again);
}

/// After resolving the conflict, `grove continue` commits the merge and
/// finishes the program; the run state disappears.
#[test]
fn continue_after_resolving_finishes_the_sync() {
    let repo = conflict_repo();
    let err = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("conflict");
    assert!(matches!(err, Error::ConflictSuspended { .. }));

    std::fs::write(repo.root().join("file.txt"), "resolved\n").expect("resolve");
    repo.git(&["add", "file.txt"]);

    cmd::resume::run(repo.root(), ResumeAction::Continue).expect("continue");

    let paths = state_paths(&repo);
    assert!(!paths.runstate.exists());
    assert_eq!(current_branch(&repo), "feature-a");
    // The merge commit exists and carries both sides.
    let parents = repo.git_output(&["rev-list", "--parents", "-n", "1", "HEAD"]);
    assert_eq!(parents.split_whitespace().count(), 3, "merge commit: {parents}");
    let content = std::fs::read_to_string(repo.root().join("file.txt")).expect("read");
    assert_eq!(content, "resolved\n");
}

/// `grove continue` refuses while conflict markers are still in the index.
#[test]
fn continue_requires_resolved_conflicts() {
    let repo = conflict_repo();
    let _ = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("conflict");

    let err = cmd::resume::run(repo.root(), ResumeAction::Continue).expect_err("still conflicted");
    assert!(err.to_string().contains("unresolved"));
}

/// `grove abort` walks back to the pre-command state.
#[test]
fn abort_after_conflict_restores_begin_state() {
    let repo = conflict_repo();
    let feature_sha = repo.sha_of("feature-a");
    let main_sha = repo.sha_of("main");
    let _ = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("conflict");

    cmd::resume::run(repo.root(), ResumeAction::Abort).expect("abort");

    let paths = state_paths(&repo);
    assert!(!paths.runstate.exists());
    assert_eq!(repo.sha_of("feature-a"), feature_sha);
    assert_eq!(repo.sha_of("main"), main_sha);
    let status = repo.git_output(&["status", "--porcelain"]);
    assert_eq!(status, "", "worktree clean after abort");
}

/// `grove skip` cleans up the conflicted merge and moves on past the
/// branch boundary.
#[test]
fn skip_after_conflict_finishes_without_the_branch() {
    let repo = conflict_repo();
    let feature_sha = repo.sha_of("feature-a");
    let _ = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("conflict");

    cmd::resume::run(repo.root(), ResumeAction::Skip).expect("skip");

    let paths = state_paths(&repo);
    assert!(!paths.runstate.exists());
    // The conflicted merge was aborted; the branch tip is unchanged.
    assert_eq!(repo.sha_of("feature-a"), feature_sha);
    let status = repo.git_output(&["status", "--porcelain"]);
    assert_eq!(status, "");
}

fn ship_repo() -> TestRepo {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    repo.create_branch("feature-a", "main");
    repo.checkout("feature-a");
    repo.commit_file("feature.txt", "the feature\n", "feat: add the feature");
    repo.checkout("main");
    repo.set_config("grove-branch.feature-a.parent", "main");
    repo.add_origin();
    repo
}

/// S3: ship via local squash-merge. The squash commit lands on main, the
/// branch disappears locally and at the remote, the lineage entry is gone.
#[test]
fn ship_squash_merges_and_cleans_up() {
    let repo = ship_repo();

    cmd::ship::run(
        repo.root(),
        Some("feature-a".to_string()),
        Some("ship the feature".to_string()),
        false,
        &mut dialog(),
        None,
    )
    .expect("ship");

    assert!(!repo.branch_exists("feature-a"));
    let remote_branches = repo.git_output(&["branch", "-r"]);
    assert!(
        !remote_branches.contains("origin/feature-a"),
        "tracking branch deleted: {remote_branches}"
    );
    let subject = repo.git_output(&["log", "-1", "--format=%s", "main"]);
    assert_eq!(subject, "ship the feature");
    assert!(repo.root().join("feature.txt").exists());
    assert_eq!(repo.config_value("grove-branch.feature-a.parent"), None);
    let paths = state_paths(&repo);
    assert!(!paths.runstate.exists());
}

/// S4: shipping a nested branch is refused and plans nothing.
#[test]
fn ship_rejects_nested_branches() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    repo.create_branch("feature-a", "main");
    repo.create_branch("feature-b", "feature-a");
    repo.set_config("grove-branch.feature-a.parent", "main");
    repo.set_config("grove-branch.feature-b.parent", "feature-a");

    let err = cmd::ship::run(
        repo.root(),
        Some("feature-b".to_string()),
        Some("msg".to_string()),
        false,
        &mut dialog(),
        None,
    )
    .expect_err("nested");
    assert!(err.to_string().contains("feature-a"));
    assert!(repo.branch_exists("feature-b"));
    let paths = state_paths(&repo);
    assert!(!paths.runstate.exists());
}

/// S6: undo after a successful ship restores the branch at its old SHA,
/// re-attaches it to main, resets main, and recreates the tracking branch.
#[test]
fn undo_after_ship_restores_everything() {
    let repo = ship_repo();
    let feature_sha = repo.sha_of("feature-a");
    let main_sha = repo.sha_of("main");

    cmd::ship::run(
        repo.root(),
        Some("feature-a".to_string()),
        Some("ship the feature".to_string()),
        false,
        &mut dialog(),
        None,
    )
    .expect("ship");
    assert!(!repo.branch_exists("feature-a"));

    cmd::resume::run(repo.root(), ResumeAction::Undo).expect("undo");

    assert!(repo.branch_exists("feature-a"));
    assert_eq!(repo.sha_of("feature-a"), feature_sha);
    assert_eq!(repo.sha_of("main"), main_sha);
    let remote_branches = repo.git_output(&["branch", "-r"]);
    assert!(remote_branches.contains("origin/feature-a"));
    assert_eq!(
        repo.config_value("grove-branch.feature-a.parent"),
        Some("main".to_string())
    );
    let paths = state_paths(&repo);
    assert!(!paths.undo.exists());
}

/// S5 + S6: killing the active branch with open changes commits them so
/// undo can bring them back as uncommitted changes.
#[test]
fn kill_active_branch_and_undo_restores_open_changes() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    repo.create_branch("feature-a", "main");
    repo.checkout("feature-a");
    repo.commit_file("feature.txt", "committed\n", "feat: committed work");
    repo.set_config("grove-branch.feature-a.parent", "main");
    std::fs::write(repo.root().join("open.txt"), "not committed\n").expect("write");

    cmd::kill::run(repo.root(), None, false, &mut dialog()).expect("kill");

    assert!(!repo.branch_exists("feature-a"));
    assert_eq!(current_branch(&repo), "main");
    assert!(!repo.root().join("open.txt").exists());
    assert_eq!(repo.config_value("grove-branch.feature-a.parent"), None);

    cmd::resume::run(repo.root(), ResumeAction::Undo).expect("undo");

    assert!(repo.branch_exists("feature-a"));
    assert_eq!(current_branch(&repo), "feature-a");
    let content = std::fs::read_to_string(repo.root().join("open.txt")).expect("read");
    assert_eq!(content, "not committed\n");
    // The changes are back as uncommitted work, not as a commit.
    let status = repo.git_output(&["status", "--porcelain"]);
    assert!(status.contains("open.txt"), "open again: {status}");
    let subject = repo.git_output(&["log", "-1", "--format=%s"]);
    assert_eq!(subject, "feat: committed work");
}

/// Kill refuses main and perennial branches.
#[test]
fn kill_refuses_main_branch() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");

    let err = cmd::kill::run(repo.root(), None, false, &mut dialog()).expect_err("refuse");
    assert!(err.to_string().contains("main"));
    assert_eq!(err.exit_code(), 2);
}

/// A fresh unfinished state with no merge in progress hard-blocks new
/// commands.
#[test]
fn unfinished_state_blocks_new_commands() {
    let repo = conflict_repo();
    let _ = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("conflict");
    // Clear the in-progress merge by hand; the persisted state remains.
    repo.git(&["merge", "--abort"]);

    let err = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("blocked");
    assert!(err.to_string().contains("unfinished"));
    let paths = state_paths(&repo);
    assert!(paths.runstate.exists());
}

/// With the merge still in progress, the dialog arbitrates; choosing
/// "abort" unwinds the old command and lets the new one proceed.
#[test]
fn unfinished_state_dialog_can_abort_the_old_command() {
    let repo = conflict_repo();
    let _ = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut dialog())
        .expect_err("conflict");

    let mut scripted = QueueDialog::new(vec!["abort".to_string()]);
    let err = cmd::sync::run(repo.root(), Vec::new(), false, false, &mut scripted)
        .expect_err("conflicts again");
    assert!(matches!(err, Error::ConflictSuspended { .. }));

    // The state on disk is the new suspension, not the old one.
    let paths = state_paths(&repo);
    let state = state_store::load(&paths.runstate)
        .expect("load")
        .expect("present");
    assert!(state.is_unfinished());
}

/// `grove status` reports both pending and undoable state without failing.
#[test]
fn status_reports_state() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    cmd::status::run(repo.root()).expect("status with no state");

    cmd::hack::run(repo.root(), Some("feature-a".to_string()), false, &mut dialog())
        .expect("hack");
    cmd::status::run(repo.root()).expect("status with undo state");
}

/// `grove config set` works before a main branch is configured, and
/// `grove config reset` clears everything including lineage.
#[test]
fn config_set_and_reset_round_trip() {
    let repo = TestRepo::new().expect("repo");

    cmd::config_cmd::run(
        repo.root(),
        cmd::config_cmd::ConfigAction::Set {
            key: "main-branch".to_string(),
            value: "main".to_string(),
            global: false,
        },
    )
    .expect("set");
    assert_eq!(
        repo.config_value("grove.main-branch"),
        Some("main".to_string())
    );

    repo.set_config("grove-branch.topic.parent", "main");
    cmd::config_cmd::run(repo.root(), cmd::config_cmd::ConfigAction::Reset).expect("reset");
    assert_eq!(repo.config_value("grove.main-branch"), None);
    assert_eq!(repo.config_value("grove-branch.topic.parent"), None);
}

/// `grove set-parent` drives the choice through the dialog.
#[test]
fn set_parent_uses_the_dialog() {
    let repo = TestRepo::new().expect("repo");
    repo.set_config("grove.main-branch", "main");
    repo.create_branch("feature-a", "main");
    repo.create_branch("feature-b", "main");
    repo.set_config("grove-branch.feature-a.parent", "main");
    repo.set_config("grove-branch.feature-b.parent", "main");
    repo.checkout("feature-b");

    let mut scripted = QueueDialog::new(vec!["feature-a".to_string()]);
    cmd::set_parent::run(repo.root(), false, &mut scripted).expect("set parent");

    assert_eq!(
        repo.config_value("grove-branch.feature-b.parent"),
        Some("feature-a".to_string())
    );
}
