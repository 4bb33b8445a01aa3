//! Webhook event payloads and classification
//!
//! Only the fields the gate makes decisions on are deserialized; the rest
//! of GitHub's payload is ignored. The event-kind set is a closed enum so
//! dispatch is exhaustive, with `Unrecognized` keeping the router open to
//! kinds GitHub adds later (logged and ignored, never an error).

use gh_client::StatusState;
use serde::Deserialize;

/// Repository fields common to all payloads
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    /// "owner/name"
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub login: String,
}

/// Head branch reference of a PR
#[derive(Debug, Clone, Deserialize)]
pub struct GitRefPayload {
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// The pull request object embedded in PR and review events
///
/// `labeled` events also carry the label that was applied, but handlers
/// re-read the live label set instead of trusting a possibly redelivered
/// snapshot, so it is not deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct PrPayload {
    pub number: u64,
    #[serde(default)]
    pub merged: bool,
    pub user: UserPayload,
    pub head: GitRefPayload,
}

/// A `pull_request` lifecycle event
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PrPayload,
    pub repository: RepositoryPayload,
}

/// A commit `status` event
///
/// Carries no PR linkage; the gate answers it with a repository-wide
/// auto-merge sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEvent {
    pub sha: String,
    pub state: StatusState,
    pub context: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    pub repository: RepositoryPayload,
}

/// A `pull_request_review` event
///
/// Any review activity is an occasion to re-check auto-merge
/// eligibility, so the action is not inspected.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewEvent {
    pub pull_request: PrPayload,
    pub repository: RepositoryPayload,
}

/// A classified webhook delivery
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Ping,
    PullRequest(PullRequestEvent),
    Status(StatusEvent),
    Review(ReviewEvent),
    Unrecognized(String),
}

/// Classify a delivery by its `X-GitHub-Event` kind and parse the body
pub fn parse(kind: &str, body: &[u8]) -> serde_json::Result<WebhookEvent> {
    Ok(match kind {
        "ping" => WebhookEvent::Ping,
        "pull_request" => WebhookEvent::PullRequest(serde_json::from_slice(body)?),
        "status" => WebhookEvent::Status(serde_json::from_slice(body)?),
        "pull_request_review" => WebhookEvent::Review(serde_json::from_slice(body)?),
        other => WebhookEvent::Unrecognized(other.to_string()),
    })
}
