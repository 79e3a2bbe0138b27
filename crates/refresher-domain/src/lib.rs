//! Refresher Domain Layer
//!
//! Core vocabulary shared by every Refresher crate: training documents, the
//! suggestions an AI reviewer produces for them, and the trait seams behind
//! which the network-facing collaborators (AI provider, GitHub) live.
//!
//! ## Key Concepts
//!
//! - **Document**: One training file with its extracted structure
//! - **Suggestion**: A categorized, prioritized update proposal with provenance
//! - **Fingerprint**: Normalized key of category + title used for deduplication
//! - **Category**: One of six fixed focus areas the reviewer evaluates against
//! - **RepoRef**: A validated GitHub repository reference
//!
//! ## Architecture
//!
//! This crate holds no I/O. Infrastructure implementations of the traits in
//! [`traits`] live in `refresher-llm` and `refresher-github`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod document;
pub mod priority;
pub mod repository;
pub mod retry;
pub mod suggestion;
pub mod traits;

// Re-exports for convenience
pub use category::{Category, FALLBACK_CATEGORY};
pub use document::{
    CellKind, CodeBlock, CodeComplexity, ContentKind, Document, DocumentFormat, Heading, LearningProgression,
    Link, LinkKind, NotebookInfo, StructuralMetadata,
};
pub use priority::Priority;
pub use repository::RepoRef;
pub use retry::{parse_retry_after, RetryPolicy, MAX_RETRY_AFTER};
pub use suggestion::{Fingerprint, Suggestion};
pub use traits::{
    Classify, ContentSource, Disposition, IssueDraft, IssueHandle, IssuePublisher, LlmProvider,
    SourceEntry,
};
