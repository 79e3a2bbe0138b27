//! Refresher Analyzer
//!
//! Runs a content review of a training repository end to end.
//!
//! # Overview
//!
//! The analyzer is responsible for:
//! - **File selection**: supported extensions, ignore patterns, size limit
//! - **Concurrent review**: bounded parallelism under one overall time budget
//! - **Aggregation**: merging suggestions across documents in path order
//! - **Issue filing**: one issue per category plus a run summary, reusing open
//!   issues with the same title
//! - **Export**: a deterministic JSON record of the run
//!
//! # Architecture
//!
//! ```text
//! ContentSource ─┐
//!                ├─ Analyzer ─→ AnalysisResult ─→ IssueFiler ─→ IssuePublisher
//! LlmProvider ───┘                      │
//!                                       └──────→ export::write_json
//! ```
//!
//! A document that cannot be reviewed is recorded as `skipped` (size limit,
//! malformed, too short) or `failed` (read error, provider error, timeout)
//! and the run continues. Rejected credentials end the run with
//! [`AnalyzerError::Configuration`].
//!
//! # Configuration
//!
//! ```toml
//! supported_extensions = [".md", ".ipynb", ".rst", ".txt"]
//! ignore_patterns = ["*.git*", "*.pyc", "__pycache__", "node_modules"]
//! max_file_size_mb = 10
//! min_content_chars = 100
//! concurrency = 4
//! analysis_timeout_secs = 300
//! focus_areas = []
//!
//! [extractor]
//! max_body_chars = 60000
//! fallback = "lenient"
//!
//! [issues]
//! create_issues = true
//! create_summary = true
//! skip_existing_issues = true
//! dry_run = false
//! label = "refresher"
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use refresher_analyzer::{export, Analyzer, AnalyzerConfig, IssueFiler};
//! use refresher_domain::RepoRef;
//! use refresher_github::{GitHubClient, GitHubConfig};
//! use refresher_llm::{GeminiConfig, GeminiProvider};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalyzerConfig::default();
//!     let github = Arc::new(GitHubClient::new(GitHubConfig::default().with_token(Some("ghp_...".into())))?);
//!     let gemini = Arc::new(GeminiProvider::new(GeminiConfig::new("api-key"))?);
//!
//!     let analyzer = Analyzer::new(Arc::clone(&github), gemini, config.clone())?;
//!     let repo = RepoRef::parse("https://github.com/hsf-training/hsf-training-docker")?;
//!
//!     let mut result = analyzer.analyze_with_shutdown(&repo, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!
//!     IssueFiler::new(github, config.issues).file(&repo, &mut result).await;
//!     export::write_json(&result, Path::new("results.json"))?;
//!     println!("{}", result.metrics.summary());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod error;
pub mod export;
mod issues;
mod publish;
mod report;
mod selection;

pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, IssueConfig, DEFAULT_ISSUE_LABEL};
pub use error::AnalyzerError;
pub use issues::{IssueComposer, TITLE_PREFIX};
pub use publish::IssueFiler;
pub use report::{
    AnalysisResult, DocumentReport, DocumentStatus, IssueKind, IssueOutcome, IssueStatus,
    RunMetrics, StopReason,
};
pub use selection::{FileSelector, Selection};
