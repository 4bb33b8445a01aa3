//! Auto-merge sweep coordination
//!
//! Every status webhook wants a full sweep of its repository's open PRs,
//! and CI posts statuses in bursts (one per context). The coordinator
//! collapses those bursts: at most one sweep loop runs at a time, and
//! requests arriving while it runs are recorded in a pending set that the
//! running loop drains before exiting. Every requested repository is
//! swept at least once after its request; N requests never cause N
//! sweeps.
//!
//! The busy flag and pending set are the only shared mutable state in the
//! process, guarded by a single async mutex that is never held across a
//! remote call.

use crate::automerge;
use crate::context::split_full_name;
use async_trait::async_trait;
use gh_client::GitHubClient;
use log::{debug, error};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs one sweep over a repository's open PRs
///
/// A trait so the coordinator's coalescing can be tested with a counting
/// stub instead of real reconciliation.
#[async_trait]
pub trait SweepRunner: Send + Sync {
    async fn sweep(&self, repo_full_name: &str);
}

/// Production sweep runner: auto-merge reconciliation across a
/// repository's open PRs
pub struct RepoSweeper {
    pub github: Arc<dyn GitHubClient>,
}

#[async_trait]
impl SweepRunner for RepoSweeper {
    async fn sweep(&self, repo_full_name: &str) {
        let Some((owner, repo)) = split_full_name(repo_full_name) else {
            error!("cannot sweep malformed repository name {:?}", repo_full_name);
            return;
        };
        automerge::sweep(&*self.github, owner, repo).await;
    }
}

#[derive(Default)]
struct SweepState {
    busy: bool,
    pending: HashSet<String>,
}

/// Single-instance coordinator collapsing sweep requests
pub struct SweepCoordinator {
    state: Mutex<SweepState>,
    runner: Arc<dyn SweepRunner>,
}

impl SweepCoordinator {
    pub fn new(runner: Arc<dyn SweepRunner>) -> Self {
        Self {
            state: Mutex::new(SweepState::default()),
            runner,
        }
    }

    /// Request that the repository be swept
    ///
    /// Returns immediately when a sweep loop is already running (the loop
    /// will pick the repository up from the pending set); otherwise the
    /// caller becomes the loop and drains the set until it stays empty.
    pub async fn request_sweep(&self, repo_full_name: &str) {
        {
            let mut state = self.state.lock().await;
            state.pending.insert(repo_full_name.to_string());
            if state.busy {
                debug!("sweep already running; coalescing request for {}", repo_full_name);
                return;
            }
            state.busy = true;
        }

        loop {
            let batch: Vec<String> = {
                let mut state = self.state.lock().await;
                if state.pending.is_empty() {
                    state.busy = false;
                    return;
                }
                state.pending.drain().collect()
            };

            for repo in batch {
                self.runner.sweep(&repo).await;
            }
        }
    }
}
