//! The closed set of atomic git operations.
//!
//! Opcodes are values: name plus the data they need, serializable as a
//! tagged union so run states survive process restarts. Each opcode knows
//! how to run, how to clean up after a mid-way failure, and how to continue
//! once the user has resolved conflicts.

use serde::{Deserialize, Serialize};

use crate::core::branch::{LocalBranchName, Remote, RemoteBranchName, Sha};
use crate::errors::{Error, Result};
use crate::vm::program::Program;
use crate::vm::RunEnv;

/// Result of running one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeOutcome {
    Completed,
    /// The opcode decided it has nothing to do (e.g. a push while offline).
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Opcode {
    AbortMerge,
    AbortRebase,
    ChangeParent {
        branch: LocalBranchName,
        parent: LocalBranchName,
    },
    Checkout {
        branch: LocalBranchName,
    },
    CheckoutIfExists {
        branch: LocalBranchName,
    },
    CherryPick {
        sha: Sha,
    },
    CommitOpenChanges,
    ConnectorMergeProposal {
        branch: LocalBranchName,
        proposal_number: u64,
        commit_message: Option<String>,
        proposal_message: String,
    },
    ContinueMerge,
    ContinueRebase,
    CreateBranch {
        branch: LocalBranchName,
        starting_point: String,
    },
    CreateTrackingBranch {
        branch: LocalBranchName,
    },
    DeleteLocalBranch {
        branch: LocalBranchName,
    },
    DeleteParentBranch {
        branch: LocalBranchName,
    },
    DeleteTrackingBranch {
        branch: RemoteBranchName,
    },
    DiscardOpenChanges,
    /// Marks the boundary between per-branch sub-programs; `grove skip`
    /// drops everything up to the next one of these.
    EndOfBranchProgram,
    EnsureHasShippableChanges {
        branch: LocalBranchName,
        parent: LocalBranchName,
    },
    Fetch,
    FetchUpstream {
        branch: LocalBranchName,
    },
    ForceDeleteLocalBranch {
        branch: LocalBranchName,
    },
    Merge {
        branch: String,
    },
    MergeParent {
        current: LocalBranchName,
        parent: LocalBranchName,
    },
    PreserveCheckoutHistory {
        previous_branch_candidates: Vec<LocalBranchName>,
    },
    PullCurrentBranch,
    Push {
        branch: LocalBranchName,
        force_if_includes: bool,
        no_push_hook: bool,
    },
    PushTags,
    QueueMessage {
        message: String,
    },
    RebaseBranch {
        branch: String,
    },
    RebaseOnto {
        onto: LocalBranchName,
        upstream: String,
    },
    RemoveLocalConfig {
        key: String,
    },
    ResetToSha {
        sha: Sha,
        hard: bool,
    },
    RestoreOpenChanges,
    SetLocalConfig {
        key: String,
        value: String,
    },
    SetParent {
        child: LocalBranchName,
        parent: LocalBranchName,
    },
    SquashMerge {
        branch: LocalBranchName,
        commit_message: String,
        parent: LocalBranchName,
    },
    StashOpenChanges,
    UndoLastCommit,
    UpdateInitialBranchLocalSHA {
        branch: LocalBranchName,
    },
    UpdateProposalTarget {
        proposal_number: u64,
        new_target: LocalBranchName,
    },
}

impl Opcode {
    pub fn run(&self, env: &mut RunEnv) -> Result<OpcodeOutcome> {
        use OpcodeOutcome::{Completed, Skipped};
        match self {
            Opcode::AbortMerge => env.frontend.abort_merge()?,
            Opcode::AbortRebase => env.frontend.abort_rebase()?,
            Opcode::ChangeParent { branch, parent } => {
                env.config.set_parent(branch, parent)?;
                env.messages
                    .push(format!("branch {branch} is now a child of {parent}"));
            }
            Opcode::Checkout { branch } => {
                if &env.backend.current_branch()? == branch {
                    return Ok(Skipped);
                }
                env.frontend.checkout(branch)?;
            }
            Opcode::CheckoutIfExists { branch } => {
                if !env.backend.branch_exists(branch)? {
                    return Ok(Skipped);
                }
                if &env.backend.current_branch()? == branch {
                    return Ok(Skipped);
                }
                env.frontend.checkout(branch)?;
            }
            Opcode::CherryPick { sha } => env.frontend.cherry_pick(sha)?,
            Opcode::CommitOpenChanges => {
                let branch = env.backend.current_branch()?;
                env.frontend.commit_open_changes(&branch)?;
            }
            Opcode::ConnectorMergeProposal {
                proposal_number,
                commit_message,
                ..
            } => {
                let connector = env.connector.ok_or_else(|| {
                    Error::ConnectorFailure("no hosting connector is configured".to_string())
                })?;
                connector.squash_merge_proposal(*proposal_number, commit_message.as_deref())?;
            }
            Opcode::ContinueMerge => env.frontend.continue_merge()?,
            Opcode::ContinueRebase => env.frontend.continue_rebase()?,
            Opcode::CreateBranch {
                branch,
                starting_point,
            } => env.frontend.create_branch(branch, starting_point)?,
            Opcode::CreateTrackingBranch { branch } => {
                if !env.config.full.is_online() {
                    return Ok(Skipped);
                }
                env.frontend
                    .create_tracking_branch(branch, &Remote::origin())?;
            }
            Opcode::DeleteLocalBranch { branch } => env.frontend.delete_local_branch(branch)?,
            Opcode::DeleteParentBranch { branch } => env.config.remove_parent(branch)?,
            Opcode::DeleteTrackingBranch { branch } => {
                if !env.config.full.is_online() {
                    return Ok(Skipped);
                }
                env.frontend.delete_tracking_branch(branch)?;
            }
            Opcode::DiscardOpenChanges => env.frontend.discard_open_changes()?,
            Opcode::EndOfBranchProgram => {}
            Opcode::EnsureHasShippableChanges { branch, parent } => {
                if !env.backend.branch_has_unmerged_changes(branch, parent)? {
                    return Err(Error::user_misuse(format!(
                        "branch {branch} has no shippable changes"
                    )));
                }
            }
            Opcode::Fetch => {
                if !env.config.full.is_online() || !env.backend.has_origin()? {
                    return Ok(Skipped);
                }
                env.frontend.fetch()?;
                env.backend.invalidate_remotes_cache();
            }
            Opcode::FetchUpstream { branch } => {
                if !env.config.full.is_online() {
                    return Ok(Skipped);
                }
                env.frontend.fetch_upstream(branch)?;
            }
            Opcode::ForceDeleteLocalBranch { branch } => {
                env.frontend.force_delete_local_branch(branch)?;
            }
            Opcode::Merge { branch } => env.frontend.merge(branch)?,
            Opcode::MergeParent { parent, .. } => env.frontend.merge(parent.as_str())?,
            Opcode::PreserveCheckoutHistory {
                previous_branch_candidates,
            } => {
                let current = env.backend.current_branch()?;
                let desired = previous_branch_candidates
                    .iter()
                    .filter(|candidate| *candidate != &current)
                    .find(|candidate| env.backend.branch_exists(candidate).unwrap_or(false));
                let Some(desired) = desired else {
                    return Ok(Skipped);
                };
                if env.backend.previously_checked_out_branch().as_ref() == Some(desired) {
                    return Ok(Skipped);
                }
                env.frontend.checkout(desired)?;
                env.frontend.checkout(&current)?;
            }
            Opcode::PullCurrentBranch => {
                if !env.config.full.is_online() {
                    return Ok(Skipped);
                }
                env.frontend.pull()?;
            }
            Opcode::Push {
                branch,
                force_if_includes,
                no_push_hook,
            } => {
                if !env.config.full.is_online() {
                    return Ok(Skipped);
                }
                env.frontend.push(branch, *force_if_includes, *no_push_hook)?;
            }
            Opcode::PushTags => {
                if !env.config.full.is_online() {
                    return Ok(Skipped);
                }
                env.frontend.push_tags()?;
            }
            Opcode::QueueMessage { message } => env.messages.push(message.clone()),
            Opcode::RebaseBranch { branch } => env.frontend.rebase(branch)?,
            Opcode::RebaseOnto { onto, upstream } => {
                env.frontend.rebase_onto(onto.as_str(), upstream)?;
            }
            Opcode::RemoveLocalConfig { key } => env.config.remove_raw_local(key)?,
            Opcode::ResetToSha { sha, hard } => env.frontend.reset_to_sha(sha, *hard)?,
            Opcode::RestoreOpenChanges => {
                if env.backend.stash_size()? == 0 {
                    return Ok(Skipped);
                }
                env.frontend.pop_stash()?;
            }
            Opcode::SetLocalConfig { key, value } => env.config.set_raw_local(key, value)?,
            Opcode::SetParent { child, parent } => env.config.set_parent(child, parent)?,
            Opcode::SquashMerge {
                branch,
                commit_message,
                ..
            } => {
                env.frontend.squash_merge(branch)?;
                env.frontend.commit_with_message(commit_message)?;
            }
            Opcode::StashOpenChanges => env.frontend.stash_open_changes()?,
            Opcode::UndoLastCommit => env.frontend.undo_last_commit()?,
            Opcode::UpdateInitialBranchLocalSHA { branch } => {
                let sha = env.backend.sha_for(branch.as_str())?;
                let info = env
                    .snapshot
                    .find_by_local_name_mut(branch)
                    .ok_or_else(|| {
                        Error::InternalInvariant(format!(
                            "branch {branch} missing from begin snapshot"
                        ))
                    })?;
                info.local_sha = Some(sha);
            }
            Opcode::UpdateProposalTarget {
                proposal_number,
                new_target,
            } => {
                let connector = env.connector.ok_or_else(|| {
                    Error::ConnectorFailure("no hosting connector is configured".to_string())
                })?;
                connector.update_proposal_target(*proposal_number, new_target)?;
                env.messages.push(format!(
                    "proposal #{proposal_number} now targets {new_target}"
                ));
            }
        }
        Ok(Completed)
    }

    /// Opcodes undoing the partial work of this opcode, prepended to the
    /// abort sequence. Also accumulated for successful opcodes so aborting
    /// later unwinds them in reverse order.
    pub fn abort_program(&self) -> Program {
        match self {
            Opcode::Merge { .. } | Opcode::MergeParent { .. } | Opcode::PullCurrentBranch => {
                Program::from(vec![Opcode::AbortMerge])
            }
            Opcode::RebaseBranch { .. } | Opcode::RebaseOnto { .. } => {
                Program::from(vec![Opcode::AbortRebase])
            }
            Opcode::SquashMerge { .. } | Opcode::CherryPick { .. } => {
                Program::from(vec![Opcode::DiscardOpenChanges])
            }
            Opcode::CreateBranch { branch, .. } => Program::from(vec![
                Opcode::ForceDeleteLocalBranch {
                    branch: branch.clone(),
                },
            ]),
            Opcode::CreateTrackingBranch { branch } => Program::from(vec![
                Opcode::DeleteTrackingBranch {
                    branch: branch.at_remote(&Remote::origin()),
                },
            ]),
            Opcode::StashOpenChanges => Program::from(vec![Opcode::RestoreOpenChanges]),
            Opcode::CommitOpenChanges => Program::from(vec![Opcode::UndoLastCommit]),
            _ => Program::new(),
        }
    }

    /// Opcodes prepended when the user resumes after resolving conflicts.
    pub fn continue_program(&self) -> Program {
        match self {
            Opcode::Merge { .. }
            | Opcode::MergeParent { .. }
            | Opcode::PullCurrentBranch
            | Opcode::SquashMerge { .. }
            | Opcode::CherryPick { .. } => Program::from(vec![Opcode::ContinueMerge]),
            Opcode::RebaseBranch { .. } | Opcode::RebaseOnto { .. } => {
                Program::from(vec![Opcode::ContinueRebase])
            }
            _ => Program::new(),
        }
    }

    /// True for opcodes whose failure means a merge conflict the user can
    /// resolve; their failure suspends the run instead of aborting it.
    pub fn is_suspendable(&self) -> bool {
        matches!(
            self,
            Opcode::Merge { .. }
                | Opcode::MergeParent { .. }
                | Opcode::RebaseBranch { .. }
                | Opcode::RebaseOnto { .. }
                | Opcode::SquashMerge { .. }
                | Opcode::CherryPick { .. }
                | Opcode::PullCurrentBranch
        )
    }

    /// True for suspendable opcodes inside sync-style per-branch programs,
    /// where skipping the rest of the branch is meaningful.
    pub fn supports_skip(&self) -> bool {
        matches!(
            self,
            Opcode::Merge { .. }
                | Opcode::MergeParent { .. }
                | Opcode::RebaseBranch { .. }
                | Opcode::RebaseOnto { .. }
                | Opcode::PullCurrentBranch
        )
    }

    /// Stable name used in logs and `grove status` output.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::AbortMerge => "AbortMerge",
            Opcode::AbortRebase => "AbortRebase",
            Opcode::ChangeParent { .. } => "ChangeParent",
            Opcode::Checkout { .. } => "Checkout",
            Opcode::CheckoutIfExists { .. } => "CheckoutIfExists",
            Opcode::CherryPick { .. } => "CherryPick",
            Opcode::CommitOpenChanges => "CommitOpenChanges",
            Opcode::ConnectorMergeProposal { .. } => "ConnectorMergeProposal",
            Opcode::ContinueMerge => "ContinueMerge",
            Opcode::ContinueRebase => "ContinueRebase",
            Opcode::CreateBranch { .. } => "CreateBranch",
            Opcode::CreateTrackingBranch { .. } => "CreateTrackingBranch",
            Opcode::DeleteLocalBranch { .. } => "DeleteLocalBranch",
            Opcode::DeleteParentBranch { .. } => "DeleteParentBranch",
            Opcode::DeleteTrackingBranch { .. } => "DeleteTrackingBranch",
            Opcode::DiscardOpenChanges => "DiscardOpenChanges",
            Opcode::EndOfBranchProgram => "EndOfBranchProgram",
            Opcode::EnsureHasShippableChanges { .. } => "EnsureHasShippableChanges",
            Opcode::Fetch => "Fetch",
            Opcode::FetchUpstream { .. } => "FetchUpstream",
            Opcode::ForceDeleteLocalBranch { .. } => "ForceDeleteLocalBranch",
            Opcode::Merge { .. } => "Merge",
            Opcode::MergeParent { .. } => "MergeParent",
            Opcode::PreserveCheckoutHistory { .. } => "PreserveCheckoutHistory",
            Opcode::PullCurrentBranch => "PullCurrentBranch",
            Opcode::Push { .. } => "Push",
            Opcode::PushTags => "PushTags",
            Opcode::QueueMessage { .. } => "QueueMessage",
            Opcode::RebaseBranch { .. } => "RebaseBranch",
            Opcode::RebaseOnto { .. } => "RebaseOnto",
            Opcode::RemoveLocalConfig { .. } => "RemoveLocalConfig",
            Opcode::ResetToSha { .. } => "ResetToSha",
            Opcode::RestoreOpenChanges => "RestoreOpenChanges",
            Opcode::SetLocalConfig { .. } => "SetLocalConfig",
            Opcode::SetParent { .. } => "SetParent",
            Opcode::SquashMerge { .. } => "SquashMerge",
            Opcode::StashOpenChanges => "StashOpenChanges",
            Opcode::UndoLastCommit => "UndoLastCommit",
            Opcode::UpdateInitialBranchLocalSHA { .. } => "UpdateInitialBranchLocalSHA",
            Opcode::UpdateProposalTarget { .. } => "UpdateProposalTarget",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::local;

    #[test]
    fn serializes_as_tagged_union() {
        let opcode = Opcode::Checkout {
            branch: local("topic"),
        };
        let json = serde_json::to_string(&opcode).expect("serialize");
        assert_eq!(json, r#"{"type":"Checkout","branch":"topic"}"#);
    }

    #[test]
    fn round_trips_through_json() {
        let opcodes = vec![
            Opcode::Fetch,
            Opcode::CreateBranch {
                branch: local("topic"),
                starting_point: "main".to_string(),
            },
            Opcode::SquashMerge {
                branch: local("topic"),
                commit_message: "msg".to_string(),
                parent: local("main"),
            },
            Opcode::Push {
                branch: local("main"),
                force_if_includes: false,
                no_push_hook: true,
            },
        ];
        let json = serde_json::to_string(&opcodes).expect("serialize");
        let back: Vec<Opcode> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, opcodes);
    }

    #[test]
    fn unknown_tag_fails_to_deserialize() {
        let err = serde_json::from_str::<Opcode>(r#"{"type":"TeleportBranch"}"#).unwrap_err();
        assert!(err.to_string().contains("TeleportBranch"));
    }

    #[test]
    fn suspendables_have_a_continuation() {
        let suspendables = [
            Opcode::Merge {
                branch: "origin/topic".to_string(),
            },
            Opcode::MergeParent {
                current: local("topic"),
                parent: local("main"),
            },
            Opcode::RebaseBranch {
                branch: "main".to_string(),
            },
            Opcode::SquashMerge {
                branch: local("topic"),
                commit_message: "msg".to_string(),
                parent: local("main"),
            },
            Opcode::CherryPick {
                sha: Sha::new("abc123"),
            },
            Opcode::PullCurrentBranch,
        ];
        for opcode in suspendables {
            assert!(opcode.is_suspendable(), "{} must suspend", opcode.name());
            assert!(
                !opcode.continue_program().is_empty(),
                "{} must know how to continue",
                opcode.name()
            );
            assert!(
                !opcode.abort_program().is_empty(),
                "{} must know how to clean up",
                opcode.name()
            );
        }
    }

    #[test]
    fn terminal_opcodes_do_not_suspend() {
        assert!(!Opcode::DeleteLocalBranch {
            branch: local("topic")
        }
        .is_suspendable());
        assert!(!Opcode::ChangeParent {
            branch: local("a"),
            parent: local("main")
        }
        .is_suspendable());
    }

    #[test]
    fn skip_support_is_limited_to_sync_style_opcodes() {
        assert!(Opcode::MergeParent {
            current: local("topic"),
            parent: local("main")
        }
        .supports_skip());
        assert!(!Opcode::SquashMerge {
            branch: local("topic"),
            commit_message: "msg".to_string(),
            parent: local("main")
        }
        .supports_skip());
    }
}
