//! Refresher Extractor
//!
//! Builds review prompts for training documents and turns the reviewer's
//! responses into categorized, deduplicated suggestions.
//!
//! # Overview
//!
//! The reviewer is asked for a JSON list of suggestions. Responses are parsed
//! strictly first; when that fails a line-oriented fallback looks for
//! bullet lists under category headings. Category and priority labels are
//! mapped onto the closed sets in `refresher-domain`, and suggestions with the
//! same fingerprint are merged.
//!
//! # Architecture
//!
//! ```text
//! Document → PromptBuilder → LlmProvider → SuggestionExtractor → SuggestionSet
//! ```
//!
//! # Example Usage
//!
//! ```
//! use refresher_extractor::{SuggestionExtractor, SuggestionSet};
//!
//! let extractor = SuggestionExtractor::default();
//! let report = extractor.extract(
//!     r#"[{"type": "software_update", "priority": "high", "title": "Update NumPy"}]"#,
//!     "_episodes/01-intro.md",
//! );
//!
//! let mut set = SuggestionSet::new();
//! set.extend(report.suggestions);
//! assert_eq!(set.len(), 1);
//! ```

#![warn(missing_docs)]

mod aggregate;
mod config;
mod error;
mod extractor;
mod fallback;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use aggregate::SuggestionSet;
pub use config::{ExtractorConfig, FallbackMode};
pub use error::ExtractorError;
pub use extractor::SuggestionExtractor;
pub use fallback::{FallbackParser, LenientLineParser, NoFallback};
pub use parser::parse_strict;
pub use prompt::{truncate_body, PromptBuilder, TRUNCATION_MARKER};
pub use types::{AnalysisRequest, ExtractionReport, ParseStrategy, ParsedResponse, RawCandidate};
