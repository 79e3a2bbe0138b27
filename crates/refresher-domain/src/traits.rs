//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the review pipeline and the
//! network. Infrastructure implementations live in other crates.

use crate::RepoRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// How a caller should react to a failed external call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient (rate limit, timeout, 5xx); try again after backing off
    Retry,

    /// Permanent for this call; record the failure and move on
    GiveUp,

    /// Invalid configuration (rejected credentials); stop the whole run
    Abort,
}

/// Classification of errors returned by external collaborators
pub trait Classify {
    /// How the caller should react to this error
    fn disposition(&self) -> Disposition;

    /// Shorthand for `disposition() == Retry`
    fn is_retriable(&self) -> bool {
        self.disposition() == Disposition::Retry
    }

    /// Shorthand for `disposition() == Abort`
    fn is_fatal(&self) -> bool {
        self.disposition() == Disposition::Abort
    }
}

/// Trait for AI provider operations
///
/// Implemented by the infrastructure layer (refresher-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for provider operations
    type Error: Classify + Display + Send + Sync + 'static;

    /// Model identifier used for audit output
    fn model_name(&self) -> &str;

    /// Generate a completion for the prompt.
    ///
    /// Returns the raw response text; interpreting it is the extractor's job.
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

/// A file listed by a content source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Repository-relative path
    pub path: String,

    /// Size in bytes as reported by the host
    pub size: u64,
}

/// Trait for reading repository content
///
/// Implemented by the infrastructure layer (refresher-github)
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Error type for source operations
    type Error: Classify + Display + Send + Sync + 'static;

    /// List every file reachable from the reference (respecting its path filter)
    async fn list_files(&self, repo: &RepoRef) -> Result<Vec<SourceEntry>, Self::Error>;

    /// Read one file as UTF-8 text
    async fn read_file(&self, repo: &RepoRef, path: &str) -> Result<String, Self::Error>;
}

/// An issue ready to be filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    /// Issue title
    pub title: String,

    /// Markdown body
    pub body: String,

    /// Labels to apply
    pub labels: Vec<String>,
}

/// A filed (or pre-existing) issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueHandle {
    /// Issue number within the repository
    pub number: u64,

    /// Browser URL
    pub url: String,
}

/// Trait for filing issues
///
/// Implemented by the infrastructure layer (refresher-github)
#[async_trait]
pub trait IssuePublisher: Send + Sync {
    /// Error type for publish operations
    type Error: Classify + Display + Send + Sync + 'static;

    /// Find an open issue with exactly this title carrying `label`
    async fn find_open_issue(
        &self,
        repo: &RepoRef,
        title: &str,
        label: &str,
    ) -> Result<Option<IssueHandle>, Self::Error>;

    /// File a new issue
    async fn publish(&self, repo: &RepoRef, draft: &IssueDraft) -> Result<IssueHandle, Self::Error>;
}
