//! Buildkite client trait

use crate::error::Result;
use crate::types::{Build, NewBuild, Pipeline};
use async_trait::async_trait;

/// Buildkite API client trait, scoped to one organization
///
/// Implementations must be `Send + Sync` so they can be shared across
/// per-delivery tasks.
#[async_trait]
pub trait BuildkiteApi: Send + Sync {
    /// Look up a pipeline by slug
    ///
    /// Returns `Ok(None)` when the pipeline does not exist; the gate treats
    /// a missing pipeline as "nothing to trigger", not as a failure.
    async fn get_pipeline(&self, slug: &str) -> Result<Option<Pipeline>>;

    /// Create a build on a pipeline
    async fn create_build(&self, pipeline: &str, build: &NewBuild) -> Result<Build>;

    /// List recent builds of a pipeline, newest first, optionally filtered
    /// by branch
    async fn list_builds(&self, pipeline: &str, branch: Option<&str>) -> Result<Vec<Build>>;

    /// Fetch the raw log output of a job
    async fn job_log(&self, pipeline: &str, build_number: u64, job_id: &str) -> Result<String>;

    /// Resolve an artifact to its short-lived signed download URL
    async fn artifact_download_url(
        &self,
        pipeline: &str,
        build_number: u64,
        job_id: &str,
        artifact_id: &str,
    ) -> Result<String>;
}
