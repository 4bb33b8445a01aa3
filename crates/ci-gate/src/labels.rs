//! Label and status adapter
//!
//! Thin idempotent wrappers over the GitHub client. Label names are
//! compared case-insensitively against a fresh fetch on every call, and
//! removing an already-absent label is a success-with-no-op: a human can
//! legitimately remove a label between our check and our act, and webhook
//! redeliveries replay the same removal.

use gh_client::{GhError, GitHubClient, NewCommitStatus, StatusState};
use log::debug;

/// Label a human applies to let an untrusted PR run CI
pub const APPROVAL_LABEL: &str = "CI";

/// Label that forces CI to be skipped with an explicit failure status
pub const SUPPRESS_LABEL: &str = "noCI";

/// Label opting a PR into auto-merge once CI is green
pub const AUTOMERGE_LABEL: &str = "automerge";

/// Commit-status context this service posts its verdicts under
pub const GATE_CONTEXT: &str = "ci-gate";

/// Whether the PR currently carries the named label (case-insensitive)
pub async fn has_label(
    github: &dyn GitHubClient,
    owner: &str,
    repo: &str,
    number: u64,
    name: &str,
) -> Result<bool, GhError> {
    let labels = github.list_labels(owner, repo, number).await?;
    Ok(labels.iter().any(|l| l.eq_ignore_ascii_case(name)))
}

/// Remove a label, treating "not present" as a no-op
///
/// Returns true iff a removal actually occurred; callers use the
/// transition to decide whether to post a one-time notification.
pub async fn remove_label(
    github: &dyn GitHubClient,
    owner: &str,
    repo: &str,
    number: u64,
    name: &str,
) -> Result<bool, GhError> {
    match github.remove_label(owner, repo, number, name).await {
        Ok(()) => Ok(true),
        Err(err) if err.is_not_found() => {
            debug!("label {:?} already absent from {}/{}#{}", name, owner, repo, number);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Post a status under the gate context, overwriting any prior verdict
/// for the same SHA
pub async fn set_gate_status(
    github: &dyn GitHubClient,
    owner: &str,
    repo: &str,
    sha: &str,
    state: StatusState,
    description: &str,
    target_url: Option<String>,
) -> Result<(), GhError> {
    github
        .set_commit_status(
            owner,
            repo,
            sha,
            &NewCommitStatus {
                context: GATE_CONTEXT.to_string(),
                state,
                description: description.to_string(),
                target_url,
            },
        )
        .await
}
