//! Recording mocks and fixtures shared by the unit tests

use crate::context::AppContext;
use crate::events::{RepositoryPayload, StatusEvent};
use async_trait::async_trait;
use buildkite_client::{
    Build, BuildState, BuildkiteApi, BuildkiteError, NewBuild, Pipeline,
};
use ci_gate_config::Config;
use gh_client::{
    CombinedStatus, GhError, GitHubClient, MergeOptions, MergeResult, NewCommitStatus, Permission,
    PrState, PullRequest, StatusState,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_WEBHOOK_SECRET: &str = "test-secret-key";

/// Sign a payload the way GitHub does for `X-Hub-Signature-256`
pub fn sign(secret: &str, payload: &[u8]) -> String {
    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Configuration fixture matching the mocks' organization and base URL
pub fn test_config() -> Config {
    Config::from_lookup(|name| {
        let value = match name {
            "BUILDKITE_TOKEN" => "bk-token",
            "BUILDKITE_ORG" => "example-org",
            "GITHUB_TOKEN" => "gh-token",
            "GITHUB_WEBHOOK_SECRET" => TEST_WEBHOOK_SECRET,
            "PUBLIC_BASE_URL" => "https://gate.example.com",
            "PUBLIC_LOG_PIPELINES" => "repo,public-repo",
            "PUBLIC_CI_REPOS" => "org/public-repo",
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

/// Full application context wired to fresh mocks
pub fn test_context() -> (AppContext, Arc<MockGitHub>, Arc<MockBuildkite>) {
    let github = Arc::new(MockGitHub::new());
    let buildkite = Arc::new(MockBuildkite::new());
    let ctx = AppContext::new(test_config(), github.clone(), buildkite.clone());
    (ctx, github, buildkite)
}

/// Build a status webhook event
pub fn status_event(
    full_name: &str,
    sha: &str,
    state: StatusState,
    context: &str,
    target_url: Option<&str>,
) -> StatusEvent {
    StatusEvent {
        sha: sha.to_string(),
        state,
        context: context.to_string(),
        description: Some("status description".to_string()),
        target_url: target_url.map(str::to_string),
        repository: RepositoryPayload {
            full_name: full_name.to_string(),
        },
    }
}

fn default_pr(number: u64) -> PullRequest {
    PullRequest {
        number,
        title: format!("Test PR #{number}"),
        author: "contributor".to_string(),
        head_sha: format!("headsha{number}"),
        head_branch: format!("feature-{number}"),
        base_branch: "main".to_string(),
        state: PrState::Open,
        merged: false,
        mergeable: None,
        html_url: format!("https://github.com/org/repo/pull/{number}"),
    }
}

/// Recording in-memory GitHub
///
/// PRs are keyed by number; owner/repo arguments are accepted but not
/// distinguished, matching how each test exercises a single repository.
#[derive(Default)]
pub struct MockGitHub {
    prs: Mutex<HashMap<u64, PullRequest>>,
    labels: Mutex<HashMap<u64, Vec<String>>>,
    changed_files: Mutex<Vec<String>>,
    permissions: Mutex<HashMap<String, Permission>>,
    fail_permissions: AtomicBool,
    combined: Mutex<HashMap<String, CombinedStatus>>,
    statuses: Mutex<Vec<(String, NewCommitStatus)>>,
    comments: Mutex<Vec<(u64, String)>>,
    merges: Mutex<Vec<(u64, MergeOptions)>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a PR, customized from open defaults by the closure
    pub fn add_pr(&self, _owner: &str, _repo: &str, number: u64, f: impl FnOnce(&mut PullRequest)) {
        let mut pr = default_pr(number);
        f(&mut pr);
        self.prs.lock().unwrap().insert(number, pr);
    }

    pub fn set_labels(&self, number: u64, names: &[&str]) {
        self.labels
            .lock()
            .unwrap()
            .insert(number, names.iter().map(|s| s.to_string()).collect());
    }

    pub fn labels(&self, number: u64) -> Vec<String> {
        self.labels
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_changed_files(&self, files: &[&str]) {
        *self.changed_files.lock().unwrap() = files.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_permission(&self, username: &str, permission: Permission) {
        self.permissions
            .lock()
            .unwrap()
            .insert(username.to_string(), permission);
    }

    /// Make every collaborator-permission lookup fail
    pub fn fail_permission_lookups(&self) {
        self.fail_permissions.store(true, Ordering::SeqCst);
    }

    pub fn set_combined_status(&self, sha: &str, combined: CombinedStatus) {
        self.combined
            .lock()
            .unwrap()
            .insert(sha.to_string(), combined);
    }

    /// Latest status posted for a (SHA, context) pair
    pub fn status(&self, sha: &str, context: &str) -> Option<NewCommitStatus> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(s, status)| s == sha && status.context == context)
            .map(|(_, status)| status.clone())
    }

    /// Every status post, in order
    pub fn status_posts(&self) -> Vec<(String, NewCommitStatus)> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().unwrap().clone()
    }

    pub fn merges(&self) -> Vec<(u64, MergeOptions)> {
        self.merges.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitHubClient for MockGitHub {
    async fn fetch_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> gh_client::error::Result<PullRequest> {
        self.prs
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| GhError::NotFound(format!("pull request #{number}")))
    }

    async fn fetch_open_pull_requests(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> gh_client::error::Result<Vec<PullRequest>> {
        let mut prs: Vec<PullRequest> = self
            .prs
            .lock()
            .unwrap()
            .values()
            .filter(|pr| pr.state == PrState::Open)
            .cloned()
            .collect();
        prs.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(prs)
    }

    async fn list_changed_files(
        &self,
        _owner: &str,
        _repo: &str,
        _number: u64,
    ) -> gh_client::error::Result<Vec<String>> {
        Ok(self.changed_files.lock().unwrap().clone())
    }

    async fn list_labels(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> gh_client::error::Result<Vec<String>> {
        Ok(self.labels(number))
    }

    async fn remove_label(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        label: &str,
    ) -> gh_client::error::Result<()> {
        let mut labels = self.labels.lock().unwrap();
        let entry = labels.entry(number).or_default();
        let before = entry.len();
        entry.retain(|l| !l.eq_ignore_ascii_case(label));
        if entry.len() == before {
            return Err(GhError::NotFound(format!("label {label:?}")));
        }
        Ok(())
    }

    async fn create_comment(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        body: &str,
    ) -> gh_client::error::Result<()> {
        self.comments
            .lock()
            .unwrap()
            .push((number, body.to_string()));
        Ok(())
    }

    async fn set_commit_status(
        &self,
        _owner: &str,
        _repo: &str,
        sha: &str,
        status: &NewCommitStatus,
    ) -> gh_client::error::Result<()> {
        self.statuses
            .lock()
            .unwrap()
            .push((sha.to_string(), status.clone()));
        Ok(())
    }

    async fn combined_status(
        &self,
        _owner: &str,
        _repo: &str,
        sha: &str,
    ) -> gh_client::error::Result<CombinedStatus> {
        Ok(self
            .combined
            .lock()
            .unwrap()
            .get(sha)
            .cloned()
            .unwrap_or(CombinedStatus {
                state: StatusState::Pending,
                total_count: 0,
                statuses: Vec::new(),
            }))
    }

    async fn merge_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        options: &MergeOptions,
    ) -> gh_client::error::Result<MergeResult> {
        self.merges.lock().unwrap().push((number, options.clone()));
        if let Some(pr) = self.prs.lock().unwrap().get_mut(&number) {
            pr.merged = true;
            pr.state = PrState::Closed;
        }
        Ok(MergeResult {
            merged: true,
            sha: Some(format!("merge-of-{}", options.sha)),
            message: None,
        })
    }

    async fn user_permission(
        &self,
        _owner: &str,
        _repo: &str,
        username: &str,
    ) -> gh_client::error::Result<Permission> {
        if self.fail_permissions.load(Ordering::SeqCst) {
            return Err(GhError::NotFound(format!("collaborator {username}")));
        }
        Ok(self
            .permissions
            .lock()
            .unwrap()
            .get(username)
            .copied()
            .unwrap_or(Permission::None))
    }
}

/// Recording in-memory Buildkite
#[derive(Default)]
pub struct MockBuildkite {
    pipelines: Mutex<HashSet<String>>,
    builds: Mutex<HashMap<String, Vec<Build>>>,
    created: Mutex<Vec<(String, NewBuild)>>,
    job_logs: Mutex<HashMap<String, String>>,
    artifact_urls: Mutex<HashMap<String, String>>,
}

impl MockBuildkite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pipeline(&self, slug: &str) {
        self.pipelines.lock().unwrap().insert(slug.to_string());
    }

    /// Register an existing build so `list_builds` can find it
    pub fn add_build(&self, pipeline: &str, build: Build) {
        self.builds
            .lock()
            .unwrap()
            .entry(pipeline.to_string())
            .or_default()
            .push(build);
    }

    pub fn set_job_log(&self, job_id: &str, content: &str) {
        self.job_logs
            .lock()
            .unwrap()
            .insert(job_id.to_string(), content.to_string());
    }

    pub fn set_artifact_url(&self, artifact_id: &str, url: &str) {
        self.artifact_urls
            .lock()
            .unwrap()
            .insert(artifact_id.to_string(), url.to_string());
    }

    /// Every build submitted through `create_build`, in order
    pub fn created_builds(&self) -> Vec<(String, NewBuild)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildkiteApi for MockBuildkite {
    async fn get_pipeline(&self, slug: &str) -> buildkite_client::error::Result<Option<Pipeline>> {
        if !self.pipelines.lock().unwrap().contains(slug) {
            return Ok(None);
        }
        Ok(Some(Pipeline {
            slug: slug.to_string(),
            name: slug.to_string(),
            web_url: Some(format!("https://buildkite.com/example-org/{slug}")),
        }))
    }

    async fn create_build(
        &self,
        pipeline: &str,
        build: &NewBuild,
    ) -> buildkite_client::error::Result<Build> {
        let mut created = self.created.lock().unwrap();
        created.push((pipeline.to_string(), build.clone()));
        let number = created.len() as u64;

        let created_build = Build {
            number,
            state: BuildState::Scheduled,
            branch: build.branch.clone(),
            commit: build.commit.clone(),
            message: Some(build.message.clone()),
            web_url: format!("https://buildkite.com/example-org/{pipeline}/builds/{number}"),
            scheduled_at: None,
            started_at: None,
            finished_at: None,
            jobs: Vec::new(),
        };
        self.builds
            .lock()
            .unwrap()
            .entry(pipeline.to_string())
            .or_default()
            .push(created_build.clone());
        Ok(created_build)
    }

    async fn list_builds(
        &self,
        pipeline: &str,
        branch: Option<&str>,
    ) -> buildkite_client::error::Result<Vec<Build>> {
        let builds = self.builds.lock().unwrap();
        let mut matching: Vec<Build> = builds
            .get(pipeline)
            .map(|b| b.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(|b| branch.map_or(true, |wanted| b.branch == wanted))
            .cloned()
            .collect();
        matching.reverse();
        Ok(matching)
    }

    async fn job_log(
        &self,
        _pipeline: &str,
        _build_number: u64,
        job_id: &str,
    ) -> buildkite_client::error::Result<String> {
        self.job_logs
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or(BuildkiteError::Api {
                status: 404,
                body: format!("no log for job {job_id}"),
            })
    }

    async fn artifact_download_url(
        &self,
        _pipeline: &str,
        _build_number: u64,
        _job_id: &str,
        artifact_id: &str,
    ) -> buildkite_client::error::Result<String> {
        self.artifact_urls
            .lock()
            .unwrap()
            .get(artifact_id)
            .cloned()
            .ok_or(BuildkiteError::Api {
                status: 404,
                body: format!("no artifact {artifact_id}"),
            })
    }
}
