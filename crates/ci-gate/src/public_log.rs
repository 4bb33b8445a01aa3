//! Public-log URL recognition and rewriting
//!
//! Buildkite's native build URLs are only readable by organization
//! members. When CI posts a status pointing at one, the gate re-posts the
//! status with a same-origin proxy URL so outside contributors can read
//! their logs. Matching is deliberately strict: a false positive would
//! proxy an arbitrary URL, a false negative merely leaves the raw link in
//! place.

use crate::context::{split_full_name, AppContext};
use crate::events::StatusEvent;
use gh_client::NewCommitStatus;
use log::debug;

/// Host Buildkite serves its web UI from
pub const BUILDKITE_HOST: &str = "https://buildkite.com";

const BUILDKITE_API_PIPELINES: &str = "https://api.buildkite.com/v2/organizations";

/// Which build a log URL addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildRef {
    /// A concrete build number
    Number(u64),
    /// The newest build on a branch (`builds/latest/<branch>`)
    Latest { branch: String },
}

/// A parsed Buildkite build log URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLocator {
    pub pipeline: String,
    pub build: BuildRef,
}

/// A parsed Buildkite artifact download API URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocator {
    pub pipeline: String,
    pub build_number: u64,
    pub job_id: String,
    pub artifact_id: String,
}

/// Parse a Buildkite build log URL for the given organization
///
/// Accepts exactly `https://buildkite.com/<org>/<pipeline>/builds/<n>` or
/// `.../builds/latest/<branch>`, with an optional trailing querystring.
pub fn parse_build_log_url(url: &str, org: &str) -> Option<BuildLocator> {
    let rest = url.strip_prefix(&format!("{BUILDKITE_HOST}/{org}/"))?;
    let rest = rest.split('?').next().unwrap_or(rest);

    let (pipeline, tail) = rest.split_once('/')?;
    if pipeline.is_empty() {
        return None;
    }

    let build_part = tail.strip_prefix("builds/")?;

    if let Some(branch) = build_part.strip_prefix("latest/") {
        if branch.is_empty() {
            return None;
        }
        return Some(BuildLocator {
            pipeline: pipeline.to_string(),
            build: BuildRef::Latest {
                branch: branch.to_string(),
            },
        });
    }

    // Strictly a positive integer: no signs, no empty, no suffix
    if build_part.is_empty() || !build_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: u64 = build_part.parse().ok()?;
    if number == 0 {
        return None;
    }

    Some(BuildLocator {
        pipeline: pipeline.to_string(),
        build: BuildRef::Number(number),
    })
}

/// Parse a Buildkite artifact download API URL for the given organization
pub fn parse_artifact_url(url: &str, org: &str) -> Option<ArtifactLocator> {
    let rest = url.strip_prefix(&format!("{BUILDKITE_API_PIPELINES}/{org}/pipelines/"))?;
    let rest = rest.split('?').next().unwrap_or(rest);

    let parts: Vec<&str> = rest.split('/').collect();
    match parts.as_slice() {
        [pipeline, "builds", number, "jobs", job_id, "artifacts", artifact_id, "download"]
            if !pipeline.is_empty() && !job_id.is_empty() && !artifact_id.is_empty() =>
        {
            let build_number: u64 = number.parse().ok()?;
            Some(ArtifactLocator {
                pipeline: pipeline.to_string(),
                build_number,
                job_id: job_id.to_string(),
                artifact_id: artifact_id.to_string(),
            })
        }
        _ => None,
    }
}

/// Build the same-origin proxy URL for a recognized build log URL
///
/// The original URL, querystring included, rides verbatim as the proxy's
/// query.
pub fn proxy_url(public_base_url: &str, original_url: &str) -> String {
    format!("{public_base_url}/buildkite_public_log?{original_url}")
}

/// Re-post a status whose target URL points at a members-only Buildkite
/// build, swapping in the public proxy URL
///
/// Repositories whose CI is already public are skipped, as are pipelines
/// outside the public-log allow-list (the proxy would refuse their logs,
/// making the rewritten link worse than the original); non-matching URLs
/// are left untouched. The re-posted status triggers another status
/// webhook, but its proxy target no longer matches the Buildkite pattern,
/// so the cycle terminates after one hop.
pub async fn rewrite_if_applicable(ctx: &AppContext, event: &StatusEvent) -> anyhow::Result<()> {
    if ctx
        .config
        .public_ci_repos
        .contains(&event.repository.full_name)
    {
        debug!(
            "{} has public CI; leaving status URL as-is",
            event.repository.full_name
        );
        return Ok(());
    }

    let Some(target_url) = &event.target_url else {
        return Ok(());
    };

    let Some(locator) = parse_build_log_url(target_url, &ctx.config.buildkite_org) else {
        debug!("ignoring non-Buildkite status URL {:?}", target_url);
        return Ok(());
    };

    // Only pipelines whose logs the proxy will actually serve get a
    // proxy link; anything else keeps the members-only original
    if !ctx.config.public_log_pipelines.contains(&locator.pipeline) {
        debug!(
            "pipeline {:?} is not in the public-log set; leaving status URL as-is",
            locator.pipeline
        );
        return Ok(());
    }

    let Some((owner, repo)) = split_full_name(&event.repository.full_name) else {
        return Ok(());
    };

    ctx.github
        .set_commit_status(
            owner,
            repo,
            &event.sha,
            &NewCommitStatus {
                context: event.context.clone(),
                state: event.state,
                description: event.description.clone().unwrap_or_default(),
                target_url: Some(proxy_url(&ctx.config.public_base_url, target_url)),
            },
        )
        .await?;

    Ok(())
}
