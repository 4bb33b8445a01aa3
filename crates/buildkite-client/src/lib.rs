//! Buildkite REST API client for the CI gate
//!
//! Trait-based client over the Buildkite v2 REST API, scoped to one
//! organization. The trait boundary mirrors `gh-client`: handlers are
//! written against [`BuildkiteApi`] and tested against recording mocks;
//! [`BuildkiteClient`] is the reqwest-backed production implementation.
//!
//! Build and job state enums are closed: an unknown state string from the
//! API is a deserialization error, not a guess. The set of backend states
//! is a contract, and rendering a state we've never seen would silently
//! mislabel a build.

pub mod client;
pub mod error;
pub mod rest_client;
pub mod types;

pub use client::BuildkiteApi;
pub use error::BuildkiteError;
pub use rest_client::BuildkiteClient;
pub use types::{Artifact, Build, BuildState, Job, JobState, NewBuild, Pipeline};
