//! Structured error type for GitHub API calls
//!
//! The important distinction is `NotFound`: removing a label that a human
//! already removed, or looking up a collaborator that isn't one, are normal
//! races under webhook redelivery and must be decidable without string
//! matching on upstream error messages.

use thiserror::Error;

/// Errors from GitHub API operations
#[derive(Debug, Error)]
pub enum GhError {
    /// The addressed resource does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other GitHub API failure
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),
}

impl GhError {
    /// Classify an octocrab error, mapping HTTP 404 to [`GhError::NotFound`]
    pub fn classify(err: octocrab::Error, what: &str) -> GhError {
        match &err {
            octocrab::Error::GitHub { source, .. }
                if source.status_code.as_u16() == 404 =>
            {
                GhError::NotFound(what.to_string())
            }
            _ => GhError::Api(err),
        }
    }

    /// Whether this error is a 404 on the addressed resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, GhError::NotFound(_))
    }
}

/// Result alias for GitHub API operations
pub type Result<T> = std::result::Result<T, GhError>;
