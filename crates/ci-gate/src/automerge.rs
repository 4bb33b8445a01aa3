//! Auto-merge reconciliation
//!
//! The per-PR state machine is re-derived from live platform state on
//! every invocation; nothing is persisted between events. Redelivered
//! webhooks therefore replay harmlessly: every decision is conditioned on
//! a transition observed right now (label actually removed, head SHA
//! still current), not on history.

use crate::labels::{self, AUTOMERGE_LABEL};
use gh_client::{GitHubClient, MergeMethod, MergeOptions, PrState, StatusState};
use log::{debug, error, info, warn};

/// Commit message used for every auto-merge
pub const AUTOMERGE_COMMIT_MESSAGE: &str = "automerge";

/// Minimum number of individual status reports before a combined
/// "success" is believed. The gate posts a status of its own, so a single
/// report proves nothing about CI having run.
pub const MIN_STATUS_COUNT: u64 = 2;

const CONFLICT_COMMENT: &str = "This pull request can no longer be merged cleanly against its \
base branch, so automatic merging has been cancelled and the automerge label removed. \
Re-apply the label after resolving the conflicts.";

const CI_FAILURE_COMMENT: &str = "CI reported a failure for the head commit, so automatic \
merging has been cancelled and the automerge label removed. Re-apply the label once CI is \
green again.";

/// Evaluate one pull request for auto-merge
///
/// Merges, comments, or no-ops depending on label, mergeability, and
/// combined CI status. Safe to call any number of times for the same PR.
pub async fn reconcile(
    github: &dyn GitHubClient,
    owner: &str,
    repo: &str,
    number: u64,
) -> anyhow::Result<()> {
    let pr = github.fetch_pull_request(owner, repo, number).await?;

    if pr.state != PrState::Open {
        return Ok(());
    }
    if !labels::has_label(github, owner, repo, number, AUTOMERGE_LABEL).await? {
        return Ok(());
    }

    match pr.mergeable {
        None => {
            // GitHub computes mergeability asynchronously; a later event
            // will find it resolved
            debug!("mergeability of {}/{}#{} not yet computed", owner, repo, number);
            Ok(())
        }
        Some(false) => {
            if labels::remove_label(github, owner, repo, number, AUTOMERGE_LABEL).await? {
                github
                    .create_comment(owner, repo, number, CONFLICT_COMMENT)
                    .await?;
            }
            Ok(())
        }
        Some(true) => {
            let combined = github.combined_status(owner, repo, &pr.head_sha).await?;
            match combined.state {
                StatusState::Success => {
                    if combined.total_count < MIN_STATUS_COUNT {
                        warn!(
                            "refusing to automerge {}/{}#{}: only {} status report(s) on {}",
                            owner, repo, number, combined.total_count, pr.head_sha
                        );
                        return Ok(());
                    }

                    // The SHA precondition makes GitHub refuse if the head
                    // moved between our fetch and the merge call
                    let result = github
                        .merge_pull_request(
                            owner,
                            repo,
                            number,
                            &MergeOptions {
                                sha: pr.head_sha.clone(),
                                method: MergeMethod::Rebase,
                                commit_message: AUTOMERGE_COMMIT_MESSAGE.to_string(),
                            },
                        )
                        .await?;

                    if result.merged {
                        info!("automerged {}/{}#{} at {}", owner, repo, number, pr.head_sha);
                    } else {
                        warn!(
                            "automerge of {}/{}#{} declined by GitHub: {:?}",
                            owner, repo, number, result.message
                        );
                    }
                    Ok(())
                }
                StatusState::Failure | StatusState::Error => {
                    if labels::remove_label(github, owner, repo, number, AUTOMERGE_LABEL).await? {
                        github
                            .create_comment(owner, repo, number, CI_FAILURE_COMMENT)
                            .await?;
                    }
                    Ok(())
                }
                StatusState::Pending => Ok(()),
            }
        }
    }
}

/// Evaluate every open PR of a repository for auto-merge
///
/// Status webhooks carry no PR linkage, so eligibility is re-checked
/// across the board. Per-PR failures are logged and do not stop the
/// sweep.
pub async fn sweep(github: &dyn GitHubClient, owner: &str, repo: &str) {
    let prs = match github.fetch_open_pull_requests(owner, repo).await {
        Ok(prs) => prs,
        Err(err) => {
            error!("listing open PRs of {}/{} failed: {}", owner, repo, err);
            return;
        }
    };

    for pr in prs {
        if let Err(err) = reconcile(github, owner, repo, pr.number).await {
            error!(
                "auto-merge reconciliation of {}/{}#{} failed: {}",
                owner, repo, pr.number, err
            );
        }
    }
}
