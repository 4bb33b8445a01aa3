//! GitHub client trait
//!
//! Defines the interface the gate logic uses to talk to GitHub.
//! Implementations must be `Send + Sync` so they can be shared across the
//! per-delivery tasks. Tests substitute recording mocks for the real
//! octocrab-backed client.

use crate::error::Result;
use crate::types::{
    CombinedStatus, MergeOptions, MergeResult, NewCommitStatus, Permission, PullRequest,
};
use async_trait::async_trait;

/// GitHub API client trait
///
/// All reads go to the live API on every call. The gate deliberately holds
/// no cache: mergeability and labels are mutable platform state and a stale
/// answer is worse than an extra request.
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Fetch a single pull request by number
    ///
    /// Returns full PR details including the mergeable tri-state, which
    /// GitHub computes asynchronously and may report as `None`.
    async fn fetch_pull_request(&self, owner: &str, repo: &str, number: u64)
        -> Result<PullRequest>;

    /// Fetch all open pull requests for a repository
    ///
    /// Used by the auto-merge sweep: a status webhook carries no PR
    /// linkage, so eligibility is re-evaluated across every open PR.
    async fn fetch_open_pull_requests(&self, owner: &str, repo: &str)
        -> Result<Vec<PullRequest>>;

    /// List the filenames changed by a pull request
    async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<String>>;

    /// List the label names currently attached to a pull request
    async fn list_labels(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<String>>;

    /// Remove a label from a pull request
    ///
    /// Fails with [`GhError::NotFound`](crate::GhError::NotFound) when the
    /// label is not present; callers that treat that as a no-op use
    /// [`GhError::is_not_found`](crate::GhError::is_not_found).
    async fn remove_label(&self, owner: &str, repo: &str, number: u64, label: &str)
        -> Result<()>;

    /// Post a comment on a pull request (issue comment)
    async fn create_comment(&self, owner: &str, repo: &str, number: u64, body: &str)
        -> Result<()>;

    /// Post a commit status, overwriting any prior status for the same
    /// (SHA, context) pair
    async fn set_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &NewCommitStatus,
    ) -> Result<()>;

    /// Fetch the combined commit status for a SHA
    async fn combined_status(&self, owner: &str, repo: &str, sha: &str)
        -> Result<CombinedStatus>;

    /// Merge a pull request
    ///
    /// The options carry a head-SHA precondition; GitHub refuses the merge
    /// if the head has moved since the SHA was recorded.
    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        options: &MergeOptions,
    ) -> Result<MergeResult>;

    /// Look up a user's permission level on a repository
    async fn user_permission(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
    ) -> Result<Permission>;
}
