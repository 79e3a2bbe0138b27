//! Refresher GitHub Integration
//!
//! REST client for the two things the review run needs from GitHub:
//!
//! - **Reading content**: default branch, recursive tree listing, file
//!   contents (implements `ContentSource`)
//! - **Filing issues**: open-issue lookup by title and label, issue creation
//!   (implements `IssuePublisher`)
//!
//! Requests carry a Bearer token when one is configured. Rate limits (429, or
//! 403 with `x-ratelimit-remaining: 0`) and server errors are retried with
//! exponential backoff; a rejected token is classified as fatal.

#![warn(missing_docs)]

mod client;
mod error;
mod title;

pub use client::{GitHubClient, GitHubConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS};
pub use error::GitHubError;
pub use title::{sanitize_title, MAX_TITLE_CHARS};
