//! Error types for analysis runs

use thiserror::Error;

/// Errors that end an analysis run
///
/// Per-document problems never surface here; they are recorded on the
/// document's report instead.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Invalid settings or credentials rejected by a collaborator
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The repository could not be listed
    #[error("Content source error: {0}")]
    Source(String),

    /// Result could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Export file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    /// Whether the error is a configuration problem rather than a runtime failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, AnalyzerError::Configuration(_))
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::Serialization(e.to_string())
    }
}
