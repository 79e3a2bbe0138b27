//! Suggestions - the durable output of a review run

use crate::{Category, Priority};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Deduplication key derived from a suggestion's category and title
///
/// The key is the SHA-256 of `category:title` after lowercasing the title and
/// collapsing whitespace, so cosmetic differences in the reviewer's wording of
/// the same title collapse to one suggestion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a category and title
    ///
    /// # Examples
    ///
    /// ```
    /// use refresher_domain::{Category, Fingerprint};
    ///
    /// let a = Fingerprint::of(Category::SoftwareUpdate, "Update NumPy to 2.0");
    /// let b = Fingerprint::of(Category::SoftwareUpdate, "  update   numpy to 2.0 ");
    /// assert_eq!(a, b);
    /// ```
    pub fn of(category: Category, title: &str) -> Self {
        let key = Self::normalized_key(category, title);
        let digest = Sha256::digest(key.as_bytes());
        Self(format!("{:x}", digest))
    }

    /// The normalized text the hash is computed over
    pub fn normalized_key(category: Category, title: &str) -> String {
        let title = title
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}:{}", category.as_str(), title)
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated digest for display
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A categorized, prioritized update proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Deduplication key (category + normalized title)
    pub fingerprint: Fingerprint,

    /// Focus area
    pub category: Category,

    /// Urgency
    pub priority: Priority,

    /// Short descriptive title
    pub title: String,

    /// What needs updating and why
    pub description: String,

    /// Why the change benefits learners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,

    /// Concrete edits to make
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_changes: Option<String>,

    /// Section or line the change applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Helpful references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<String>,

    /// Document the suggestion was first produced for
    pub source_document_path: String,

    /// Every document that produced this suggestion, in merge order
    pub provenance: Vec<String>,

    /// How many times the suggestion was produced in this run
    pub occurrences: usize,
}

impl Suggestion {
    /// Create a suggestion for a single source document
    pub fn new(
        category: Category,
        priority: Priority,
        title: impl Into<String>,
        description: impl Into<String>,
        source_document_path: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let source_document_path = source_document_path.into();
        Self {
            fingerprint: Fingerprint::of(category, &title),
            category,
            priority,
            title,
            description: description.into(),
            justification: None,
            specific_changes: None,
            location: None,
            resources: None,
            provenance: vec![source_document_path.clone()],
            source_document_path,
            occurrences: 1,
        }
    }

    /// Merge a duplicate (same fingerprint) into this suggestion.
    ///
    /// Keeps the higher priority, extends provenance without repeating a path,
    /// adds occurrence counts, appends a description that is not already
    /// present, and fills optional details this suggestion lacks.
    pub fn merge(&mut self, other: Suggestion) {
        debug_assert_eq!(self.fingerprint, other.fingerprint);

        self.priority = self.priority.max(other.priority);
        self.occurrences += other.occurrences;

        for path in other.provenance {
            if !self.provenance.contains(&path) {
                self.provenance.push(path);
            }
        }

        let extra = other.description.trim();
        if !extra.is_empty() && !self.description.contains(extra) {
            if self.description.trim().is_empty() {
                self.description = extra.to_string();
            } else {
                self.description.push_str("\n\n");
                self.description.push_str(extra);
            }
        }

        fill(&mut self.justification, other.justification);
        fill(&mut self.specific_changes, other.specific_changes);
        fill(&mut self.location, other.location);
        fill(&mut self.resources, other.resources);
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}
