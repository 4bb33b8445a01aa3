//! CI trigger
//!
//! Forwards an approved pull request to Buildkite and reports the outcome
//! under the gate context. The gate's job is to gate: a repository whose
//! pipeline was never set up gets a green gate status with an explanatory
//! description, not a failed webhook.

use crate::context::AppContext;
use crate::labels::{self, APPROVAL_LABEL, SUPPRESS_LABEL};
use buildkite_client::NewBuild;
use gh_client::StatusState;
use log::{info, warn};
use std::collections::HashMap;

/// Metadata key carrying the `:`-joined changed-file manifest, letting CI
/// jobs scope their work to affected files
pub const AFFECTED_FILES_KEY: &str = "affected-files";

/// Compute the pipeline slug for a repository
///
/// The repository basename with path separators and dots normalized to
/// hyphens, so "org/repo.js" addresses pipeline "repo-js".
pub fn pipeline_slug(repo_full_name: &str) -> String {
    let basename = repo_full_name
        .rsplit('/')
        .next()
        .unwrap_or(repo_full_name);
    basename.replace(['.', '/'], "-")
}

/// Submit a build for a pull request's head commit
pub async fn trigger(
    ctx: &AppContext,
    owner: &str,
    repo: &str,
    number: u64,
    head_sha: &str,
) -> anyhow::Result<()> {
    if labels::has_label(&*ctx.github, owner, repo, number, SUPPRESS_LABEL).await? {
        labels::set_gate_status(
            &*ctx.github,
            owner,
            repo,
            head_sha,
            StatusState::Failure,
            &format!("remove the {SUPPRESS_LABEL} label to allow CI to run"),
            None,
        )
        .await?;
        return Ok(());
    }

    let branch = format!("pull/{number}/head");
    let slug = pipeline_slug(&format!("{owner}/{repo}"));

    let files = ctx.github.list_changed_files(owner, repo, number).await?;
    let manifest = files.join(":");

    let Some(pipeline) = ctx.buildkite.get_pipeline(&slug).await? else {
        warn!("no pipeline {:?} configured for {}/{}", slug, owner, repo);
        labels::set_gate_status(
            &*ctx.github,
            owner,
            repo,
            head_sha,
            StatusState::Success,
            &format!("pipeline {slug} is not configured; skipping CI"),
            None,
        )
        .await?;
        labels::remove_label(&*ctx.github, owner, repo, number, APPROVAL_LABEL).await?;
        return Ok(());
    };

    let short_sha = head_sha.get(..8).unwrap_or(head_sha);
    let mut meta_data = HashMap::new();
    meta_data.insert(AFFECTED_FILES_KEY.to_string(), manifest);

    let build = ctx
        .buildkite
        .create_build(
            &pipeline.slug,
            &NewBuild {
                commit: head_sha.to_string(),
                branch,
                message: format!("Pull Request #{number} - {short_sha}"),
                meta_data,
            },
        )
        .await?;

    info!(
        "triggered build {}#{} for {}/{}#{}",
        pipeline.slug, build.number, owner, repo, number
    );

    labels::set_gate_status(
        &*ctx.github,
        owner,
        repo,
        head_sha,
        StatusState::Success,
        "accepted for CI",
        Some(build.web_url.clone()),
    )
    .await?;

    // Back to the ungranted rest state: a future push needs re-approval
    labels::remove_label(&*ctx.github, owner, repo, number, APPROVAL_LABEL).await?;

    Ok(())
}
