//! Buildkite API data transfer objects
//!
//! Field presence follows the build lifecycle: `started_at` is only
//! populated once a build or job has actually started, `finished_at` once
//! it has finished. Callers must gate on state before reading timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A Buildkite pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// URL-safe pipeline identifier
    pub slug: String,

    /// Display name
    pub name: String,

    /// Web URL of the pipeline
    #[serde(default)]
    pub web_url: Option<String>,
}

/// State of a build
///
/// Closed set; an unknown state string fails deserialization loudly
/// instead of being mapped to a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Scheduled,
    Waiting,
    WaitingFailed,
    Blocked,
    Running,
    Passed,
    Failing,
    Failed,
    Canceling,
    Canceled,
    TimedOut,
    Skipped,
    NotRun,
}

impl BuildState {
    /// Whether the build has started running (so `started_at` is valid)
    pub fn has_started(&self) -> bool {
        !matches!(
            self,
            BuildState::Scheduled
                | BuildState::Waiting
                | BuildState::WaitingFailed
                | BuildState::Blocked
        )
    }

    /// Short human-readable label for page headers
    pub fn label(&self) -> &'static str {
        match self {
            BuildState::Scheduled => "scheduled",
            BuildState::Waiting => "waiting",
            BuildState::WaitingFailed => "waiting (failed)",
            BuildState::Blocked => "blocked",
            BuildState::Running => "running",
            BuildState::Passed => "passed",
            BuildState::Failing => "failing",
            BuildState::Failed => "failed",
            BuildState::Canceling => "canceling",
            BuildState::Canceled => "canceled",
            BuildState::TimedOut => "timed out",
            BuildState::Skipped => "skipped",
            BuildState::NotRun => "not run",
        }
    }
}

/// A build in a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    /// Build number, unique within the pipeline
    pub number: u64,

    /// Current state
    pub state: BuildState,

    /// Branch the build runs on (e.g., "pull/7/head")
    pub branch: String,

    /// Commit SHA the build runs at
    pub commit: String,

    /// Build message
    #[serde(default)]
    pub message: Option<String>,

    /// Web URL of the build
    pub web_url: String,

    /// When the build was scheduled
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,

    /// When the build started; only valid once the state is at or past
    /// `running`
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When the build finished; only valid in terminal states
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Jobs of this build (inlined by the list/get build endpoints)
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// State of a job within a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Waiting,
    WaitingFailed,
    Blocked,
    BlockedFailed,
    Unblocked,
    UnblockedFailed,
    Limiting,
    Limited,
    Scheduled,
    Assigned,
    Accepted,
    Running,
    Passed,
    Failed,
    Canceling,
    Canceled,
    TimingOut,
    TimedOut,
    Skipped,
    Broken,
    Expired,
}

impl JobState {
    /// Short human-readable label for job sections
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Waiting => "waiting",
            JobState::WaitingFailed => "waiting (failed)",
            JobState::Blocked => "blocked",
            JobState::BlockedFailed => "blocked (failed)",
            JobState::Unblocked => "unblocked",
            JobState::UnblockedFailed => "unblocked (failed)",
            JobState::Limiting => "limiting",
            JobState::Limited => "limited",
            JobState::Scheduled => "scheduled",
            JobState::Assigned => "assigned",
            JobState::Accepted => "accepted",
            JobState::Running => "running",
            JobState::Passed => "passed",
            JobState::Failed => "failed",
            JobState::Canceling => "canceling",
            JobState::Canceled => "canceled",
            JobState::TimingOut => "timing out",
            JobState::TimedOut => "timed out",
            JobState::Skipped => "skipped",
            JobState::Broken => "broken",
            JobState::Expired => "expired",
        }
    }
}

/// A job (step) within a build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job UUID
    pub id: String,

    /// Job kind ("script", "waiter", "manual", "trigger")
    #[serde(rename = "type")]
    pub kind: String,

    /// Job name; waiter jobs have none
    #[serde(default)]
    pub name: Option<String>,

    /// Current state; absent on waiter jobs
    #[serde(default)]
    pub state: Option<JobState>,

    /// Command line the job runs
    #[serde(default)]
    pub command: Option<String>,

    /// Web URL of the job
    #[serde(default)]
    pub web_url: Option<String>,

    /// When the job was scheduled
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,

    /// When an agent started the job
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When the job finished
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// An artifact uploaded by a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact UUID
    pub id: String,

    /// Path of the artifact within the job's workspace
    pub path: String,

    /// Filename component of the path
    pub filename: String,
}

/// Request body for creating a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBuild {
    /// Commit SHA to build
    pub commit: String,

    /// Branch to record the build under
    pub branch: String,

    /// Build message shown in the Buildkite UI
    pub message: String,

    /// Free-form metadata available to jobs
    #[serde(default)]
    pub meta_data: HashMap<String, String>,
}
