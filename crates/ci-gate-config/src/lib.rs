//! Environment-sourced configuration for the CI gate
//!
//! All configuration comes from environment variables, loaded once at
//! startup and read-only thereafter. A missing required variable is a
//! fatal startup error; the process must exit before serving traffic
//! rather than run with a half-configured trust boundary.

use std::collections::HashSet;
use std::env;
use thiserror::Error;

/// Default listen port when `PORT` is not set
pub const DEFAULT_PORT: u16 = 5000;

/// Errors from configuration loading
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process-wide configuration
///
/// The three sets are static allow-lists: users trusted to trigger CI
/// without a label, pipelines whose logs may be proxied publicly, and
/// repositories whose CI is already public (no log-URL rewriting needed).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Buildkite API access token
    pub buildkite_token: String,

    /// Buildkite organization slug
    pub buildkite_org: String,

    /// GitHub API access token
    pub github_token: String,

    /// Shared secret for webhook signature verification
    pub webhook_secret: String,

    /// Externally reachable base URL of this service, no trailing slash
    pub public_base_url: String,

    /// Listen port
    pub port: u16,

    /// Pipelines whose build logs may be served through the public-log
    /// proxy
    pub public_log_pipelines: HashSet<String>,

    /// Serve every job's log on the public-log page, not only jobs marked
    /// public by naming convention
    pub expose_all_logs: bool,

    /// Usernames trusted to trigger CI without the approval label
    pub trusted_users: HashSet<String>,

    /// Repositories (full names) whose CI backend is already public;
    /// their status URLs are never rewritten
    pub public_ci_repos: HashSet<String>,

    /// Directory the static assets are served from; `None` lets the
    /// binary fall back to its bundled assets directory
    pub assets_dir: Option<String>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Exists so tests can exercise loading without mutating the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(ConfigError::Missing(name)),
            }
        };

        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
        };

        let expose_all_logs = match lookup("EXPOSE_ALL_LOGS") {
            None => false,
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                name: "EXPOSE_ALL_LOGS",
                value,
            })?,
        };

        let public_base_url = required("PUBLIC_BASE_URL")?
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            buildkite_token: required("BUILDKITE_TOKEN")?,
            buildkite_org: required("BUILDKITE_ORG")?,
            github_token: required("GITHUB_TOKEN")?,
            webhook_secret: required("GITHUB_WEBHOOK_SECRET")?,
            public_base_url,
            port,
            public_log_pipelines: parse_list(lookup("PUBLIC_LOG_PIPELINES")),
            expose_all_logs,
            trusted_users: parse_list(lookup("TRUSTED_USERS")),
            public_ci_repos: parse_list(lookup("PUBLIC_CI_REPOS")),
            assets_dir: lookup("ASSETS_DIR").filter(|v| !v.is_empty()),
        })
    }
}

/// Parse a comma-separated list, trimming entries and dropping empties
fn parse_list(value: Option<String>) -> HashSet<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}
