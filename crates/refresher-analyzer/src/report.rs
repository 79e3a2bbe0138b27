//! Run results: per-document status, metrics and filed issues

use chrono::{DateTime, Utc};
use refresher_domain::{Category, DocumentFormat, Priority, Suggestion};
use refresher_extractor::ParseStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// How a document's review ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Reviewed; zero suggestions still counts as success
    Succeeded,

    /// Not reviewed (size limit, malformed, too short, unsupported)
    Skipped,

    /// Review attempted and failed (provider, source, cancellation)
    Failed,
}

impl DocumentStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Succeeded => "succeeded",
            DocumentStatus::Skipped => "skipped",
            DocumentStatus::Failed => "failed",
        }
    }
}

/// Outcome of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Repository-relative path
    pub path: String,

    /// Format, when the path had a supported extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DocumentFormat>,

    /// Final status
    pub status: DocumentStatus,

    /// Short machine-readable reason for skipped and failed documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Suggestions extracted for this document, before cross-document merging
    pub suggestions: usize,

    /// Parser that produced them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ParseStrategy>,

    /// Whether the body was truncated in the prompt
    #[serde(default)]
    pub truncated: bool,

    /// Reviewer's overall assessment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_assessment: Option<String>,
}

impl DocumentReport {
    /// Report for a document that was not reviewed
    pub fn skipped(path: impl Into<String>, reason: &str, detail: impl Into<String>) -> Self {
        Self::ended(path, DocumentStatus::Skipped, reason, detail)
    }

    /// Report for a document whose review failed
    pub fn failed(path: impl Into<String>, reason: &str, detail: impl Into<String>) -> Self {
        Self::ended(path, DocumentStatus::Failed, reason, detail)
    }

    fn ended(path: impl Into<String>, status: DocumentStatus, reason: &str, detail: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            format: DocumentFormat::from_path(&path),
            path,
            status,
            reason: Some(reason.to_string()),
            detail: Some(detail.into()),
            suggestions: 0,
            strategy: None,
            truncated: false,
            overall_assessment: None,
        }
    }
}

/// Which issue an outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Suggestions of one category
    Category(Category),

    /// Run summary
    Summary,
}

/// What happened to one issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Filed by this run
    Created,

    /// An open issue with the same title already existed
    Existing,

    /// Rendered only
    DryRun,

    /// Filing failed
    Failed,
}

/// Result of filing one issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOutcome {
    /// Category or summary
    pub kind: IssueKind,

    /// Issue title as drafted
    pub title: String,

    /// Outcome
    pub status: IssueStatus,

    /// Issue number when created or reused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,

    /// Issue URL when created or reused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Error message when filing failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Rendered body for dry runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Documents considered (selected plus oversize)
    pub documents_total: usize,

    /// Documents reviewed
    pub succeeded: usize,

    /// Documents not reviewed
    pub skipped: usize,

    /// Documents whose review failed
    pub failed: usize,

    /// Distinct suggestions after merging
    pub total_suggestions: usize,

    /// Suggestions folded into an earlier one with the same fingerprint
    pub merged_duplicates: usize,

    /// Category labels coerced onto the fixed set
    pub category_normalized: usize,

    /// Priorities missing or unrecognized
    pub priority_defaulted: usize,

    /// Response entries dropped for lacking a title
    pub rejected_entries: usize,

    /// Distinct suggestions per category
    pub by_category: BTreeMap<Category, usize>,

    /// Distinct suggestions per priority
    pub by_priority: BTreeMap<Priority, usize>,

    /// Documents with at least one suggestion
    pub files_with_suggestions: usize,

    /// Issues filed
    pub issues_created: usize,

    /// Existing issues reused
    pub issues_existing: usize,

    /// Issues that could not be filed
    pub issues_failed: usize,
}

impl RunMetrics {
    /// Record a finished document
    pub fn record_document(&mut self, report: &DocumentReport) {
        self.documents_total += 1;
        match report.status {
            DocumentStatus::Succeeded => self.succeeded += 1,
            DocumentStatus::Skipped => self.skipped += 1,
            DocumentStatus::Failed => self.failed += 1,
        }
        if report.suggestions > 0 {
            self.files_with_suggestions += 1;
        }
    }

    /// Record a filed (or attempted) issue
    pub fn record_issue(&mut self, outcome: &IssueOutcome) {
        match outcome.status {
            IssueStatus::Created => self.issues_created += 1,
            IssueStatus::Existing => self.issues_existing += 1,
            IssueStatus::Failed => self.issues_failed += 1,
            IssueStatus::DryRun => {}
        }
    }

    /// Recompute the suggestion distribution from the final set
    pub fn record_suggestions(&mut self, suggestions: &[Suggestion]) {
        self.total_suggestions = suggestions.len();
        self.by_category.clear();
        self.by_priority.clear();
        for suggestion in suggestions {
            *self.by_category.entry(suggestion.category).or_insert(0) += 1;
            *self.by_priority.entry(suggestion.priority).or_insert(0) += 1;
        }
    }

    /// Generate a plain-text summary of the metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Analysis Summary".to_string(),
            "================".to_string(),
            format!(
                "Documents: {} ({} succeeded, {} skipped, {} failed)",
                self.documents_total, self.succeeded, self.skipped, self.failed
            ),
            format!("Suggestions: {}", self.total_suggestions),
            format!("Files with suggestions: {}", self.files_with_suggestions),
        ];

        if !self.by_category.is_empty() {
            lines.push(String::new());
            lines.push("By category:".to_string());
            for (category, count) in &self.by_category {
                lines.push(format!("  {}: {}", category.display_name(), count));
            }
        }

        if !self.by_priority.is_empty() {
            lines.push(String::new());
            lines.push("By priority:".to_string());
            for priority in Priority::DESCENDING {
                if let Some(count) = self.by_priority.get(&priority) {
                    lines.push(format!("  {}: {}", priority, count));
                }
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Normalization: {} categories coerced, {} priorities defaulted, {} entries rejected",
            self.category_normalized, self.priority_defaulted, self.rejected_entries
        ));
        if self.issues_created + self.issues_existing + self.issues_failed > 0 {
            lines.push(format!(
                "Issues: {} created, {} existing, {} failed",
                self.issues_created, self.issues_existing, self.issues_failed
            ));
        }

        lines.join("\n")
    }
}

/// Why a run stopped before every document finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Interrupted (Ctrl-C)
    Cancelled,

    /// Overall run budget exhausted
    Timeout,
}

impl StopReason {
    /// Reason code recorded on unfinished documents
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Cancelled => "cancelled",
            StopReason::Timeout => "timeout",
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Unique run identifier (UUIDv7, time-ordered)
    pub run_id: Uuid,

    /// Repository URL as given
    pub repository: String,

    /// Branch analyzed, when one was named
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Path filter, when one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Model that reviewed the documents
    pub model: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Set when the run stopped early
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped: Option<StopReason>,

    /// Counters
    pub metrics: RunMetrics,

    /// Per-document outcomes, in path order
    pub documents: Vec<DocumentReport>,

    /// Deduplicated suggestions, in fingerprint order
    pub suggestions: Vec<Suggestion>,

    /// Issue outcomes, in filing order
    #[serde(default)]
    pub issues: Vec<IssueOutcome>,
}

impl AnalysisResult {
    /// Whether any document failed or any issue could not be filed
    pub fn has_failures(&self) -> bool {
        self.metrics.failed > 0 || self.metrics.issues_failed > 0 || self.stopped.is_some()
    }

    /// Add an issue outcome and count it
    pub fn push_issue(&mut self, outcome: IssueOutcome) {
        self.metrics.record_issue(&outcome);
        self.issues.push(outcome);
    }

    /// Issue outcome for a category, if one was attempted
    pub fn category_issue(&self, category: Category) -> Option<&IssueOutcome> {
        self.issues
            .iter()
            .find(|issue| issue.kind == IssueKind::Category(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(path: &str, status: DocumentStatus, suggestions: usize) -> DocumentReport {
        DocumentReport {
            path: path.into(),
            format: Some(DocumentFormat::Markdown),
            status,
            reason: None,
            detail: None,
            suggestions,
            strategy: None,
            truncated: false,
            overall_assessment: None,
        }
    }

    #[test]
    fn test_record_documents() {
        let mut metrics = RunMetrics::default();
        metrics.record_document(&report("a.md", DocumentStatus::Succeeded, 2));
        metrics.record_document(&report("b.md", DocumentStatus::Succeeded, 0));
        metrics.record_document(&DocumentReport::skipped("c.md", "size_limit", "too big"));
        metrics.record_document(&DocumentReport::failed("d.md", "provider_error", "boom"));

        assert_eq!(metrics.documents_total, 4);
        assert_eq!(metrics.succeeded, 2);
        assert_eq!(metrics.skipped, 1);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.files_with_suggestions, 1);
    }

    #[test]
    fn test_record_suggestions() {
        let mut metrics = RunMetrics::default();
        metrics.record_suggestions(&[
            Suggestion::new(Category::BestPractice, Priority::High, "a", "", "x.md"),
            Suggestion::new(Category::BestPractice, Priority::Low, "b", "", "x.md"),
            Suggestion::new(Category::ResourceUpdate, Priority::High, "c", "", "x.md"),
        ]);
        assert_eq!(metrics.total_suggestions, 3);
        assert_eq!(metrics.by_category[&Category::BestPractice], 2);
        assert_eq!(metrics.by_priority[&Priority::High], 2);

        let summary = metrics.summary();
        assert!(summary.contains("Suggestions: 3"));
        assert!(summary.contains("  Best Practices: 2"));
        assert!(summary.find("  high: 2").unwrap() < summary.find("  low: 1").unwrap());
    }

    #[test]
    fn test_issue_outcome_serialization() {
        let outcome = IssueOutcome {
            kind: IssueKind::Category(Category::SoftwareUpdate),
            title: "t".into(),
            status: IssueStatus::Created,
            number: Some(4),
            url: None,
            error: None,
            body: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"]["category"], "software_update");
        assert_eq!(json["status"], "created");
        assert_eq!(json["number"], 4);

        let summary = IssueOutcome {
            kind: IssueKind::Summary,
            ..outcome
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "summary");
    }
}
