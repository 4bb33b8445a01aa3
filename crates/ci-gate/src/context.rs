//! Shared application context
//!
//! One context is built at startup and cloned into every per-delivery
//! task. Everything inside is `Arc`-shared and read-only except the sweep
//! coordinator, which owns the only mutable coordination state in the
//! process.

use crate::signature::SignatureValidator;
use crate::sweeper::{RepoSweeper, SweepCoordinator};
use buildkite_client::BuildkiteApi;
use ci_gate_config::Config;
use gh_client::GitHubClient;
use secrecy::SecretString;
use std::sync::Arc;

/// Shared handles for webhook processing
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub github: Arc<dyn GitHubClient>,
    pub buildkite: Arc<dyn BuildkiteApi>,
    pub sweeper: Arc<SweepCoordinator>,
    pub validator: Arc<SignatureValidator>,
}

impl AppContext {
    /// Wire up the context from loaded configuration and API clients
    pub fn new(
        config: Config,
        github: Arc<dyn GitHubClient>,
        buildkite: Arc<dyn BuildkiteApi>,
    ) -> Self {
        let validator = Arc::new(SignatureValidator::new(SecretString::from(
            config.webhook_secret.clone(),
        )));
        let sweeper = Arc::new(SweepCoordinator::new(Arc::new(RepoSweeper {
            github: github.clone(),
        })));

        Self {
            config: Arc::new(config),
            github,
            buildkite,
            sweeper,
            validator,
        }
    }
}

/// Split a repository full name ("owner/repo") into its components
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let (owner, repo) = full_name.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}
