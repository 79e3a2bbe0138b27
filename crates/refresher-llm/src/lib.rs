//! Refresher AI Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `refresher-domain`.
//!
//! # Providers
//!
//! - `GeminiProvider`: Google Gemini `generateContent` REST API
//! - `MockProvider`: Deterministic canned responses for testing
//!
//! Providers return the model's raw text. They never interpret it; that is
//! the extractor's job.
//!
//! # Examples
//!
//! ```
//! use refresher_llm::MockProvider;
//! use refresher_domain::LlmProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("[]");
//! let result = provider.generate("review this lesson").await.unwrap();
//! assert_eq!(result, "[]");
//! # }
//! ```

#![warn(missing_docs)]

pub mod gemini;
pub mod mock;

use refresher_domain::{Classify, Disposition};
use thiserror::Error;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use mock::MockProvider;

/// Errors that can occur during AI provider operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Provider rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Quota or rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Provider-side failure (HTTP 5xx)
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message from the error envelope or body
        message: String,
    },

    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request rejected for another reason (HTTP 4xx)
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message from the error envelope or body
        message: String,
    },

    /// Successful call without any generated text
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider cannot be used as configured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Classify for LlmError {
    fn disposition(&self) -> Disposition {
        match self {
            LlmError::RateLimitExceeded(_)
            | LlmError::Timeout
            | LlmError::Server { .. }
            | LlmError::Communication(_) => Disposition::Retry,
            LlmError::Authentication(_) | LlmError::Configuration(_) => Disposition::Abort,
            LlmError::ModelNotAvailable(_)
            | LlmError::Api { .. }
            | LlmError::EmptyResponse(_)
            | LlmError::InvalidResponse(_) => Disposition::GiveUp,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else {
            LlmError::Communication(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispositions() {
        assert_eq!(
            LlmError::RateLimitExceeded("quota".into()).disposition(),
            Disposition::Retry
        );
        assert!(LlmError::Timeout.is_retriable());
        assert!(LlmError::Server { status: 503, message: String::new() }.is_retriable());
        assert!(LlmError::Authentication("bad key".into()).is_fatal());
        assert!(!LlmError::Authentication("bad key".into()).is_retriable());
        assert_eq!(
            LlmError::EmptyResponse("no candidates".into()).disposition(),
            Disposition::GiveUp
        );
        assert_eq!(
            LlmError::ModelNotAvailable("gemini-x".into()).disposition(),
            Disposition::GiveUp
        );
    }
}
