//! GitHub API client for the CI gate
//!
//! This crate provides a trait-based GitHub API client. The trait boundary
//! exists so the event-handling logic can be exercised against recording
//! mocks; the production implementation is a thin octocrab wrapper.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              GitHubClient trait                  │
//! │  - fetch_pull_request() / open PRs / files       │
//! │  - labels, statuses, comments                    │
//! │  - merge, collaborator permission                │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!              ┌─────────────────┐
//!              │ OctocrabClient  │
//!              │ (direct API)    │
//!              └─────────────────┘
//! ```
//!
//! Errors carry a structured reason so callers can distinguish "label does
//! not exist" (a benign race under webhook redelivery) from real API
//! failures without matching on message strings.

pub mod client;
pub mod error;
pub mod octocrab_client;
pub mod types;

pub use client::GitHubClient;
pub use error::GhError;
pub use octocrab_client::OctocrabClient;
pub use types::{
    CombinedStatus, CommitStatus, MergeMethod, MergeOptions, MergeResult, NewCommitStatus,
    Permission, PrState, PullRequest, StatusState,
};

// Re-export octocrab so consumers don't need to depend on it directly
pub use octocrab;
