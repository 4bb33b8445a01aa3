//! GitHub API data transfer objects
//!
//! These types represent the data returned from the GitHub API. They are
//! intentionally separate from octocrab's models so the gate logic and its
//! tests only ever see the fields it actually makes decisions on.

use serde::{Deserialize, Serialize};

/// A pull request from the GitHub API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number (e.g., 123)
    pub number: u64,

    /// PR title
    pub title: String,

    /// Author's GitHub username
    pub author: String,

    /// HEAD commit SHA
    pub head_sha: String,

    /// HEAD branch name (e.g., "feature/foo")
    pub head_branch: String,

    /// Base branch name (e.g., "main")
    pub base_branch: String,

    /// Open or closed
    pub state: PrState,

    /// Whether the PR has been merged
    pub merged: bool,

    /// Whether the PR is mergeable. `None` means GitHub has not computed
    /// it yet; callers must treat that as "ask again on a later event".
    pub mergeable: Option<bool>,

    /// PR URL for linking back to GitHub
    pub html_url: String,
}

/// Open/closed state of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    Open,
    Closed,
}

/// State of a commit status, both individual and combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    /// Check is still running
    Pending,
    /// Check passed
    Success,
    /// Check failed
    Failure,
    /// Check errored before producing a verdict
    Error,
}

/// A commit status to be posted
///
/// Posting a status for the same (SHA, context) pair overwrites the
/// previous one; that latest-wins channel is how the gate reports its
/// verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCommitStatus {
    /// Status context (e.g., "ci-gate")
    pub context: String,

    /// State to report
    pub state: StatusState,

    /// Human-readable description
    pub description: String,

    /// Optional URL for more details
    pub target_url: Option<String>,
}

/// An individual commit status as reported by GitHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitStatus {
    /// Status context (e.g., "ci/buildkite")
    pub context: String,

    /// Current state
    pub state: StatusState,

    /// Description of the status
    pub description: Option<String>,

    /// URL for more details
    pub target_url: Option<String>,
}

/// Combined commit status from the GitHub API
///
/// GitHub aggregates all individual statuses on a SHA into one verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedStatus {
    /// Overall state combining all statuses
    pub state: StatusState,

    /// Total number of individual status checks
    pub total_count: u64,

    /// Individual statuses
    pub statuses: Vec<CommitStatus>,
}

/// Merge method for pull requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMethod {
    /// Create a merge commit
    Merge,
    /// Squash all commits into one
    Squash,
    /// Rebase commits onto the base branch
    #[default]
    Rebase,
}

/// Parameters for merging a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// SHA the head must still be at for the merge to proceed.
    ///
    /// GitHub rejects the merge if the head moved after this was recorded,
    /// which is the guard against merging a commit nobody looked at.
    pub sha: String,

    /// How to merge
    pub method: MergeMethod,

    /// Commit message for the merge
    pub commit_message: String,
}

/// Result of a merge operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    /// Whether the merge was performed
    pub merged: bool,
    /// SHA of the resulting commit (if merged)
    pub sha: Option<String>,
    /// Message from the merge operation
    pub message: Option<String>,
}

/// Repository permission level of a collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Admin,
    Write,
    Read,
    None,
}

impl Permission {
    /// Whether this permission level allows pushing to the repository
    pub fn can_push(&self) -> bool {
        matches!(self, Permission::Admin | Permission::Write)
    }

    /// Parse the `permission` field of the collaborator-permission endpoint
    pub fn from_api(value: &str) -> Permission {
        match value {
            "admin" => Permission::Admin,
            "write" => Permission::Write,
            "read" => Permission::Read,
            _ => Permission::None,
        }
    }
}
