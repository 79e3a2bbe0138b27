//! Error types for the GitHub client

use refresher_domain::{Classify, Disposition};
use thiserror::Error;

/// GitHub API errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GitHubError {
    /// Primary or secondary rate limit hit (429, or 403 with no quota left)
    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    /// Token rejected
    #[error("GitHub authentication failed: {0}")]
    Authentication(String),

    /// Token lacks permission for the operation
    #[error("GitHub permission denied: {0}")]
    PermissionDenied(String),

    /// Repository, branch or file does not exist
    #[error("Not found on GitHub: {0}")]
    NotFound(String),

    /// Request rejected as invalid (422 and other 4xx)
    #[error("GitHub API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status
        status: u16,
        /// Message from the response body
        message: String,
    },

    /// GitHub-side failure
    #[error("GitHub server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status
        status: u16,
        /// Message from the response body
        message: String,
    },

    /// Request timed out
    #[error("GitHub request timed out")]
    Timeout,

    /// Network-level failure
    #[error("GitHub communication error: {0}")]
    Communication(String),

    /// Response body was not what the API documents
    #[error("Invalid GitHub response: {0}")]
    InvalidResponse(String),

    /// File content could not be decoded as UTF-8 text
    #[error("Cannot decode {path}: {reason}")]
    Decode {
        /// Repository path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Invalid client settings
    #[error("GitHub configuration error: {0}")]
    Configuration(String),
}

impl Classify for GitHubError {
    fn disposition(&self) -> Disposition {
        match self {
            GitHubError::RateLimited(_)
            | GitHubError::Server { .. }
            | GitHubError::Timeout
            | GitHubError::Communication(_) => Disposition::Retry,
            GitHubError::Authentication(_) | GitHubError::Configuration(_) => Disposition::Abort,
            GitHubError::PermissionDenied(_)
            | GitHubError::NotFound(_)
            | GitHubError::Api { .. }
            | GitHubError::InvalidResponse(_)
            | GitHubError::Decode { .. } => Disposition::GiveUp,
        }
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GitHubError::Timeout
        } else if e.is_decode() {
            GitHubError::InvalidResponse(e.to_string())
        } else {
            GitHubError::Communication(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GitHubError {
    fn from(e: serde_json::Error) -> Self {
        GitHubError::InvalidResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispositions() {
        assert!(GitHubError::RateLimited("x".into()).is_retriable());
        assert!(GitHubError::Server { status: 502, message: String::new() }.is_retriable());
        assert!(GitHubError::Authentication("bad".into()).is_fatal());
        assert_eq!(
            GitHubError::PermissionDenied("no".into()).disposition(),
            Disposition::GiveUp
        );
        assert_eq!(
            GitHubError::Api { status: 422, message: "Validation Failed".into() }.disposition(),
            Disposition::GiveUp
        );
    }
}
