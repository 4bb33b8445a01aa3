//! Error type for Buildkite API calls

use thiserror::Error;

/// Errors from Buildkite API operations
#[derive(Debug, Error)]
pub enum BuildkiteError {
    /// Transport-level failure (connection, TLS, body read)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Buildkite API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Artifact download endpoint answered without a redirect target
    #[error("artifact download response carried no redirect location")]
    MissingRedirect,
}

/// Result alias for Buildkite API operations
pub type Result<T> = std::result::Result<T, BuildkiteError>;
