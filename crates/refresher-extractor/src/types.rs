//! Types for prompts and extraction results

use refresher_domain::Suggestion;
use serde::{Deserialize, Serialize};

/// A rendered request for the AI provider
///
/// Built once per document and consumed by one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Path of the document being reviewed
    pub document_path: String,

    /// Title shown to the reviewer
    pub title: String,

    /// Complete prompt text
    pub prompt: String,

    /// Whether the document body was cut to fit the budget
    pub truncated: bool,
}

/// A suggestion as the reviewer wrote it, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidate {
    /// Category label as written (`category` or `type`)
    pub category: Option<String>,

    /// Priority label as written
    pub priority: Option<String>,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Why the change matters
    pub justification: Option<String>,

    /// Concrete edits
    pub specific_changes: Option<String>,

    /// Where in the document
    pub location: Option<String>,

    /// References
    pub resources: Option<String>,
}

/// Which parser produced the suggestions of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// JSON array or `{"suggestions": [...]}` envelope
    Strict,

    /// Line-oriented fallback heuristic
    Lenient,

    /// Nothing usable found
    None,
}

impl ParseStrategy {
    /// Get the strategy name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStrategy::Strict => "strict",
            ParseStrategy::Lenient => "lenient",
            ParseStrategy::None => "none",
        }
    }
}

/// Result of extracting one response
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// Normalized suggestions, duplicates within the response merged
    pub suggestions: Vec<Suggestion>,

    /// Parser that produced them
    pub strategy: ParseStrategy,

    /// Suggestions whose category label had to be coerced
    pub category_normalized: usize,

    /// Suggestions whose priority was missing or unrecognized
    pub priority_defaulted: usize,

    /// Entries dropped for lacking a title
    pub rejected: usize,

    /// Reviewer's overall assessment of the document, if given
    pub overall_assessment: Option<String>,
}

impl ExtractionReport {
    /// Report for a response with nothing usable in it
    pub fn empty() -> Self {
        Self {
            suggestions: Vec::new(),
            strategy: ParseStrategy::None,
            category_normalized: 0,
            priority_defaulted: 0,
            rejected: 0,
            overall_assessment: None,
        }
    }
}

/// Structured content of a response before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Candidate suggestions in response order
    pub candidates: Vec<RawCandidate>,

    /// Entries that were not usable
    pub rejected: usize,

    /// `overall_assessment` from the envelope
    pub overall_assessment: Option<String>,
}
