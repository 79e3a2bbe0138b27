//! Error types for format processing

use thiserror::Error;

/// Errors that make a document unusable for review
///
/// Every variant carries the document path. The orchestrator records these as
/// skipped documents; none of them abort a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    /// File is larger than the configured limit
    #[error("{path}: file size {size} bytes exceeds limit of {limit} bytes")]
    SizeLimit {
        /// Document path
        path: String,
        /// Size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Content could not be parsed in its declared format
    #[error("{path}: malformed content: {reason}")]
    Malformed {
        /// Document path
        path: String,
        /// Parser message
        reason: String,
    },

    /// Too little text to be worth reviewing
    #[error("{path}: only {chars} characters of content (minimum {min})")]
    TooShort {
        /// Document path
        path: String,
        /// Characters of analysis text
        chars: usize,
        /// Configured minimum
        min: usize,
    },

    /// Extension is not a supported training format
    #[error("{path}: unsupported file format")]
    Unsupported {
        /// Document path
        path: String,
    },
}

impl ProcessingError {
    /// Machine-readable skip reason recorded in the run report
    pub fn reason(&self) -> &'static str {
        match self {
            ProcessingError::SizeLimit { .. } => "size_limit",
            ProcessingError::Malformed { .. } => "malformed",
            ProcessingError::TooShort { .. } => "too_short",
            ProcessingError::Unsupported { .. } => "unsupported_format",
        }
    }

    /// Path of the document the error refers to
    pub fn path(&self) -> &str {
        match self {
            ProcessingError::SizeLimit { path, .. }
            | ProcessingError::Malformed { path, .. }
            | ProcessingError::TooShort { path, .. }
            | ProcessingError::Unsupported { path } => path,
        }
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        ProcessingError::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
