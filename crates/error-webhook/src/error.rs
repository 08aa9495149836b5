//! Error types for dispatching to GitHub.

use thiserror::Error;

/// Errors that can occur when dispatching an error record.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Required GitHub settings are absent
    #[error("Missing required GitHub environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    /// A GitHub setting is present but unusable
    #[error("Invalid GitHub configuration: {0}")]
    InvalidConfig(String),

    /// GitHub answered with a non-success status
    #[error("GitHub API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
