//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
///
/// None of these escape [`crate::SuggestionExtractor::extract`]; a response
/// that cannot be parsed degrades to zero suggestions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractorError {
    /// Response is not in the expected structure
    #[error("Invalid suggestion format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
