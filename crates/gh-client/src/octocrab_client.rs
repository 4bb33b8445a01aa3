//! Octocrab-based GitHub API client
//!
//! Direct implementation of the `GitHubClient` trait using the octocrab
//! library. Endpoints octocrab models natively go through the typed API;
//! the rest (statuses, merge, collaborator permission) use octocrab's raw
//! route helpers with local response types.

use crate::client::GitHubClient;
use crate::error::{GhError, Result};
use crate::types::{
    CombinedStatus, CommitStatus, MergeOptions, MergeResult, NewCommitStatus, Permission,
    PrState, PullRequest, StatusState,
};
use async_trait::async_trait;
use log::debug;
use octocrab::Octocrab;
use serde::Deserialize;
use std::sync::Arc;

/// Direct GitHub API client using octocrab
#[derive(Debug, Clone)]
pub struct OctocrabClient {
    octocrab: Arc<Octocrab>,
}

impl OctocrabClient {
    /// Create a new client with the given octocrab instance
    pub fn new(octocrab: Arc<Octocrab>) -> Self {
        Self { octocrab }
    }

    /// Build a client from a personal access token
    pub fn from_token(token: String) -> Result<Self> {
        let octocrab = Octocrab::builder().personal_token(token).build()?;
        Ok(Self::new(Arc::new(octocrab)))
    }
}

#[async_trait]
impl GitHubClient for OctocrabClient {
    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest> {
        debug!("Fetching PR {}/{}#{}", owner, repo, number);

        let pr = self
            .octocrab
            .pulls(owner, repo)
            .get(number)
            .await
            .map_err(|e| GhError::classify(e, &format!("pull request #{number}")))?;

        Ok(convert_pull_request(&pr))
    }

    async fn fetch_open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<PullRequest>> {
        debug!("Fetching open PRs for {}/{}", owner, repo);

        let mut prs = Vec::new();
        let mut page_num = 1u32;
        const PER_PAGE: u8 = 100;

        loop {
            let page = self
                .octocrab
                .pulls(owner, repo)
                .list()
                .state(octocrab::params::State::Open)
                .per_page(PER_PAGE)
                .page(page_num)
                .send()
                .await?;

            if page.items.is_empty() {
                break;
            }

            for pr in page.items {
                prs.push(convert_pull_request(&pr));
            }

            page_num += 1;
        }

        // Sort by PR number (descending) for stable ordering
        prs.sort_by(|a, b| b.number.cmp(&a.number));

        debug!("Fetched {} open PRs for {}/{}", prs.len(), owner, repo);
        Ok(prs)
    }

    async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<String>> {
        let page = self
            .octocrab
            .pulls(owner, repo)
            .list_files(number)
            .await
            .map_err(|e| GhError::classify(e, &format!("files of pull request #{number}")))?;

        Ok(page.items.into_iter().map(|f| f.filename).collect())
    }

    async fn list_labels(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<String>> {
        let page = self
            .octocrab
            .issues(owner, repo)
            .list_labels_for_issue(number)
            .per_page(100)
            .send()
            .await
            .map_err(|e| GhError::classify(e, &format!("labels of #{number}")))?;

        Ok(page.items.into_iter().map(|l| l.name).collect())
    }

    async fn remove_label(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<()> {
        debug!("Removing label {:?} from {}/{}#{}", label, owner, repo, number);

        let route = format!("/repos/{owner}/{repo}/issues/{number}/labels/{label}");
        // GitHub answers the DELETE with the remaining labels
        let _: Vec<octocrab::models::Label> = self
            .octocrab
            .delete(route, None::<&()>)
            .await
            .map_err(|e| GhError::classify(e, &format!("label {label} on #{number}")))?;

        Ok(())
    }

    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<()> {
        self.octocrab
            .issues(owner, repo)
            .create_comment(number, body)
            .await?;
        Ok(())
    }

    async fn set_commit_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        status: &NewCommitStatus,
    ) -> Result<()> {
        debug!(
            "Setting status {:?}/{:?} on {}/{} @ {}",
            status.context, status.state, owner, repo, sha
        );

        let route = format!("/repos/{owner}/{repo}/statuses/{sha}");
        let _: serde_json::Value = self.octocrab.post(route, Some(status)).await?;
        Ok(())
    }

    async fn combined_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CombinedStatus> {
        debug!("Fetching combined status for {}/{} @ {}", owner, repo, sha);

        // Raw GET: octocrab's Reference type doesn't address commit SHAs
        let route = format!("/repos/{owner}/{repo}/commits/{sha}/status");
        let status: octocrab::models::CombinedStatus =
            self.octocrab.get(route, None::<&()>).await?;

        let state = convert_status_state(&status.state);
        let statuses = status
            .statuses
            .into_iter()
            .map(|s| CommitStatus {
                context: s.context.unwrap_or_else(|| "unknown".to_string()),
                state: convert_status_state(&s.state),
                description: s.description,
                target_url: s.target_url,
            })
            .collect();

        Ok(CombinedStatus {
            state,
            total_count: status.total_count as u64,
            statuses,
        })
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        options: &MergeOptions,
    ) -> Result<MergeResult> {
        debug!(
            "Merging {}/{}#{} ({:?} at {})",
            owner, repo, number, options.method, options.sha
        );

        let route = format!("/repos/{owner}/{repo}/pulls/{number}/merge");
        let body = serde_json::json!({
            "sha": options.sha,
            "merge_method": options.method,
            "commit_message": options.commit_message,
        });

        let response: MergeResponse = self.octocrab.put(route, Some(&body)).await?;
        Ok(MergeResult {
            merged: response.merged,
            sha: response.sha,
            message: response.message,
        })
    }

    async fn user_permission(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
    ) -> Result<Permission> {
        let route = format!("/repos/{owner}/{repo}/collaborators/{username}/permission");
        let response: PermissionResponse = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| GhError::classify(e, &format!("collaborator {username}")))?;

        Ok(Permission::from_api(&response.permission))
    }
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    #[serde(default)]
    merged: bool,
    sha: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    permission: String,
}

/// Convert octocrab PullRequest to our PullRequest type
fn convert_pull_request(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        _ => PrState::Closed,
    };

    PullRequest {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        author: pr
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        head_sha: pr.head.sha.clone(),
        head_branch: pr.head.ref_field.clone(),
        base_branch: pr.base.ref_field.clone(),
        state,
        merged: pr.merged_at.is_some(),
        mergeable: pr.mergeable,
        html_url: pr
            .html_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_default(),
    }
}

/// Convert octocrab StatusState to our StatusState
fn convert_status_state(state: &octocrab::models::StatusState) -> StatusState {
    match state {
        octocrab::models::StatusState::Success => StatusState::Success,
        octocrab::models::StatusState::Pending => StatusState::Pending,
        octocrab::models::StatusState::Failure => StatusState::Failure,
        octocrab::models::StatusState::Error => StatusState::Error,
        _ => StatusState::Pending,
    }
}
