//! Synthesize an undo program from two branch snapshots.
//!
//! The diff walks every branch the command touched and emits opcodes that
//! restore existence and tip SHA: deleted branches are recreated at their
//! begin SHA, created branches are force-deleted, moved branches are reset.
//! Remote tips are not force-rewound; only deleted tracking branches are
//! recreated.

use crate::core::branches::{BranchInfo, BranchesSnapshot, SyncStatus};
use crate::vm::opcode::Opcode;
use crate::vm::program::Program;

/// Program that walks the repository from `end` back to `begin`.
pub fn undo_branches_program(begin: &BranchesSnapshot, end: &BranchesSnapshot) -> Program {
    let mut program = Program::new();

    // Recreate local branches that the command deleted, before anything
    // tries to check them out.
    for info in begin.local_branches() {
        let name = info.local_name.as_ref().expect("local branch");
        if end.has_local_branch(name) {
            continue;
        }
        if let Some(sha) = &info.local_sha {
            program.append(Opcode::CreateBranch {
                branch: name.clone(),
                starting_point: sha.as_str().to_string(),
            });
            if info.has_tracking_branch() && tracking_branch_gone(end, info) {
                program.append(Opcode::CreateTrackingBranch {
                    branch: name.clone(),
                });
            }
        }
    }

    // Move away from branches that are about to disappear.
    program.append(Opcode::CheckoutIfExists {
        branch: begin.active.clone(),
    });

    // Drop local branches the command created.
    for info in end.local_branches() {
        let name = info.local_name.as_ref().expect("local branch");
        if !begin.has_local_branch(name) {
            program.append(Opcode::ForceDeleteLocalBranch {
                branch: name.clone(),
            });
        }
    }

    // Reset local branches whose tip moved.
    for info in begin.local_branches() {
        let name = info.local_name.as_ref().expect("local branch");
        let Some(begin_sha) = &info.local_sha else {
            continue;
        };
        let Some(end_info) = end.find_by_local_name(name) else {
            continue;
        };
        if end_info.local_sha.as_ref() == Some(begin_sha) {
            continue;
        }
        program.append(Opcode::Checkout {
            branch: name.clone(),
        });
        program.append(Opcode::ResetToSha {
            sha: begin_sha.clone(),
            hard: true,
        });
    }

    program.append(Opcode::CheckoutIfExists {
        branch: begin.active.clone(),
    });
    program
}

fn tracking_branch_gone(end: &BranchesSnapshot, begin_info: &BranchInfo) -> bool {
    let Some(remote_name) = &begin_info.remote_name else {
        return false;
    };
    !end.branches.iter().any(|info| {
        info.remote_name.as_ref() == Some(remote_name)
            && info.sync_status != SyncStatus::DeletedAtRemote
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local, remote_only_info, snapshot_with_branches};
    use crate::core::branch::Sha;

    /// Undo of a ship: the shipped branch was deleted (locally and at the
    /// remote) and the parent tip moved. The undo program recreates the
    /// branch at its old SHA, recreates the tracking branch, and resets the
    /// parent.
    #[test]
    fn restores_deleted_branch_and_moved_parent() {
        let mut begin = snapshot_with_branches(
            "feature-a",
            &[("main", "111111"), ("feature-a", "222222")],
        );
        // feature-a had a tracking branch before the ship.
        begin.branches[1].remote_name =
            Some(crate::core::branch::RemoteBranchName::new("origin/feature-a").expect("name"));
        begin.branches[1].remote_sha = Some(Sha::new("222222"));

        let end = snapshot_with_branches("main", &[("main", "333333")]);

        let program = undo_branches_program(&begin, &end);
        let opcodes: Vec<Opcode> = program.into_iter().collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::CreateBranch {
                    branch: local("feature-a"),
                    starting_point: "222222".to_string(),
                },
                Opcode::CreateTrackingBranch {
                    branch: local("feature-a"),
                },
                Opcode::CheckoutIfExists {
                    branch: local("feature-a"),
                },
                Opcode::Checkout {
                    branch: local("main"),
                },
                Opcode::ResetToSha {
                    sha: Sha::new("111111"),
                    hard: true,
                },
                Opcode::CheckoutIfExists {
                    branch: local("feature-a"),
                },
            ]
        );
    }

    /// Undo of a hack: the created branch is force-deleted.
    #[test]
    fn deletes_created_branches() {
        let begin = snapshot_with_branches("main", &[("main", "111111")]);
        let end = snapshot_with_branches(
            "feature-a",
            &[("main", "111111"), ("feature-a", "111111")],
        );

        let program = undo_branches_program(&begin, &end);
        let opcodes: Vec<Opcode> = program.into_iter().collect();
        assert!(opcodes.contains(&Opcode::ForceDeleteLocalBranch {
            branch: local("feature-a")
        }));
        assert!(!opcodes
            .iter()
            .any(|op| matches!(op, Opcode::ResetToSha { .. })));
    }

    /// Unchanged snapshots produce only the checkout-restore frame.
    #[test]
    fn no_changes_means_no_repairs() {
        let begin = snapshot_with_branches("main", &[("main", "111111")]);
        let program = undo_branches_program(&begin, &begin.clone());
        let opcodes: Vec<Opcode> = program.into_iter().collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::CheckoutIfExists {
                    branch: local("main")
                },
                Opcode::CheckoutIfExists {
                    branch: local("main")
                },
            ]
        );
    }

    /// Remote-only branches never produce local repairs, even when they
    /// disappear.
    #[test]
    fn remote_only_branches_are_ignored() {
        let mut begin = snapshot_with_branches("main", &[("main", "111111")]);
        begin.branches.push(remote_only_info("drive", "999999"));
        let end = snapshot_with_branches("main", &[("main", "111111")]);

        let program = undo_branches_program(&begin, &end);
        assert!(!program
            .iter()
            .any(|op| matches!(op, Opcode::CreateBranch { .. })));
    }
}
