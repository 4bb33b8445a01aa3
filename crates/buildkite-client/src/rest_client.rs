//! Reqwest-based Buildkite REST client
//!
//! Talks to `https://api.buildkite.com/v2/organizations/<org>`. A second
//! reqwest client with redirects disabled is kept for the artifact
//! download endpoint, which answers with a 302 whose Location header is
//! the short-lived signed URL we need to hand back verbatim.

use crate::client::BuildkiteApi;
use crate::error::{BuildkiteError, Result};
use crate::types::{Build, NewBuild, Pipeline};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LOCATION};
use reqwest::StatusCode;
use serde::Deserialize;

const API_ROOT: &str = "https://api.buildkite.com/v2";

/// Direct Buildkite API client using reqwest
#[derive(Debug, Clone)]
pub struct BuildkiteClient {
    http: reqwest::Client,
    no_redirect: reqwest::Client,
    org_base: String,
}

impl BuildkiteClient {
    /// Create a client for one organization, authenticating with the given
    /// API access token
    pub fn new(token: &str, org: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| BuildkiteError::Api {
                status: 0,
                body: "API token is not a valid header value".to_string(),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers.clone())
            .build()?;
        let no_redirect = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            no_redirect,
            org_base: format!("{API_ROOT}/organizations/{org}"),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BuildkiteError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl BuildkiteApi for BuildkiteClient {
    async fn get_pipeline(&self, slug: &str) -> Result<Option<Pipeline>> {
        debug!("Fetching pipeline {}", slug);

        let url = format!("{}/pipelines/{}", self.org_base, slug);
        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check(response).await?;
        Ok(Some(response.json::<Pipeline>().await?))
    }

    async fn create_build(&self, pipeline: &str, build: &NewBuild) -> Result<Build> {
        debug!(
            "Creating build on {} for {} @ {}",
            pipeline, build.branch, build.commit
        );

        let url = format!("{}/pipelines/{}/builds", self.org_base, pipeline);
        let response = self.http.post(&url).json(build).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Build>().await?)
    }

    async fn list_builds(&self, pipeline: &str, branch: Option<&str>) -> Result<Vec<Build>> {
        let url = format!("{}/pipelines/{}/builds", self.org_base, pipeline);
        let mut request = self.http.get(&url).query(&[("per_page", "50")]);
        if let Some(branch) = branch {
            request = request.query(&[("branch", branch)]);
        }

        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<Vec<Build>>().await?)
    }

    async fn job_log(&self, pipeline: &str, build_number: u64, job_id: &str) -> Result<String> {
        let url = format!(
            "{}/pipelines/{}/builds/{}/jobs/{}/log",
            self.org_base, pipeline, build_number, job_id
        );

        #[derive(Deserialize)]
        struct JobLog {
            content: String,
        }

        let response = Self::check(self.http.get(&url).send().await?).await?;
        Ok(response.json::<JobLog>().await?.content)
    }

    async fn artifact_download_url(
        &self,
        pipeline: &str,
        build_number: u64,
        job_id: &str,
        artifact_id: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/pipelines/{}/builds/{}/jobs/{}/artifacts/{}/download",
            self.org_base, pipeline, build_number, job_id, artifact_id
        );

        let response = self.no_redirect.get(&url).send().await?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return location.ok_or(BuildkiteError::MissingRedirect);
        }

        if status.is_success() {
            // Some deployments answer 200 with a JSON body instead
            #[derive(Deserialize)]
            struct DownloadUrl {
                url: String,
            }
            return Ok(response.json::<DownloadUrl>().await?.url);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BuildkiteError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
