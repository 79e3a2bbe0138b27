//! Rendering suggestions as GitHub issues

use crate::report::{AnalysisResult, DocumentStatus, IssueKind, IssueStatus};
use refresher_domain::{Category, IssueDraft, Priority, Suggestion};
use refresher_extractor::SuggestionSet;
use std::fmt::Write;

/// Prefix of every issue title
pub const TITLE_PREFIX: &str = "[Refresher]";

// GitHub rejects bodies over 65536 characters
const MAX_BODY_CHARS: usize = 60_000;
const TOP_SUGGESTIONS: usize = 10;

/// Builds issue drafts from a run's suggestions
#[derive(Debug, Clone)]
pub struct IssueComposer {
    label: String,
}

impl IssueComposer {
    /// Create a composer that tags issues with `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }

    /// Title of the issue for a category
    pub fn category_title(category: Category) -> String {
        format!(
            "{} {} suggestions",
            TITLE_PREFIX,
            category.display_name().replace('/', " and ")
        )
    }

    /// Title of the summary issue
    pub fn summary_title() -> String {
        format!("{} Training content review summary", TITLE_PREFIX)
    }

    /// One draft per category that has suggestions, in category order
    pub fn category_drafts(&self, suggestions: &[Suggestion]) -> Vec<(Category, IssueDraft)> {
        let set: SuggestionSet = suggestions.iter().cloned().collect();
        set.by_category()
            .into_iter()
            .map(|(category, group)| (category, self.category_draft(category, &group)))
            .collect()
    }

    fn category_draft(&self, category: Category, group: &[&Suggestion]) -> IssueDraft {
        let highest = group
            .iter()
            .map(|s| s.priority)
            .max()
            .unwrap_or_default();

        let mut body = String::new();
        let _ = writeln!(body, "## {}\n", category.display_name());
        let _ = writeln!(body, "_{}_\n", category.focus_description());
        let _ = writeln!(body, "{} suggestion(s), highest priority **{}**.\n", group.len(), highest);

        for (i, suggestion) in group.iter().enumerate() {
            let section = render_suggestion(i + 1, suggestion);
            if body.chars().count() + section.chars().count() > MAX_BODY_CHARS {
                let _ = writeln!(
                    body,
                    "\n_... {} more suggestion(s) omitted; see the JSON export._",
                    group.len() - i
                );
                break;
            }
            body.push_str(&section);
        }

        IssueDraft {
            title: Self::category_title(category),
            body,
            labels: vec![
                self.label.clone(),
                format!("category:{}", category.as_str()),
                format!("priority:{}", highest.as_str()),
            ],
        }
    }

    /// Summary of the whole run, linking the category issues already attempted
    pub fn summary_draft(&self, result: &AnalysisResult) -> IssueDraft {
        let metrics = &result.metrics;
        let mut body = String::new();

        let _ = writeln!(body, "## Training content review\n");
        let _ = writeln!(body, "- **Repository:** {}", result.repository);
        let _ = writeln!(body, "- **Date:** {}", result.started_at.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(body, "- **Model:** {}", result.model);
        let _ = writeln!(body, "- **Run:** `{}`\n", result.run_id);

        let _ = writeln!(body, "### Documents\n");
        let _ = writeln!(body, "| Status | Count |\n|---|---|");
        let _ = writeln!(body, "| Succeeded | {} |", metrics.succeeded);
        let _ = writeln!(body, "| Skipped | {} |", metrics.skipped);
        let _ = writeln!(body, "| Failed | {} |\n", metrics.failed);

        let _ = writeln!(body, "### Suggestions by category\n");
        let _ = writeln!(body, "| Category | Suggestions | Issue |\n|---|---|---|");
        for (category, count) in &metrics.by_category {
            let link = result
                .category_issue(*category)
                .and_then(|issue| match (issue.status, issue.number) {
                    (IssueStatus::Created | IssueStatus::Existing, Some(number)) => {
                        Some(format!("#{}", number))
                    }
                    _ => None,
                })
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(body, "| {} | {} | {} |", category.display_name(), count, link);
        }

        let _ = writeln!(body, "\n### Priority distribution\n");
        for priority in Priority::DESCENDING {
            let count = metrics.by_priority.get(&priority).copied().unwrap_or(0);
            let _ = writeln!(body, "- {}: {}", priority, count);
        }

        let mut top: Vec<&Suggestion> = result.suggestions.iter().collect();
        top.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.provenance.len().cmp(&a.provenance.len()))
                .then_with(|| a.title.cmp(&b.title))
        });
        if !top.is_empty() {
            let _ = writeln!(body, "\n### Top suggestions\n");
            let _ = writeln!(body, "| Priority | Category | Title | Found in |\n|---|---|---|---|");
            for suggestion in top.iter().take(TOP_SUGGESTIONS) {
                let _ = writeln!(
                    body,
                    "| {} | {} | {} | {} |",
                    suggestion.priority,
                    suggestion.category.as_str(),
                    table_cell(&suggestion.title),
                    suggestion
                        .provenance
                        .iter()
                        .map(|p| format!("`{}`", p))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }

        let problems: Vec<_> = result
            .documents
            .iter()
            .filter(|d| d.status != DocumentStatus::Succeeded)
            .collect();
        if !problems.is_empty() {
            let _ = writeln!(body, "\n### Documents not reviewed\n");
            for doc in problems {
                let _ = writeln!(
                    body,
                    "- `{}`: {} ({})",
                    doc.path,
                    doc.status.as_str(),
                    doc.reason.as_deref().unwrap_or("unknown")
                );
            }
        }

        IssueDraft {
            title: Self::summary_title(),
            body,
            labels: vec![self.label.clone(), "summary".to_string()],
        }
    }
}

fn render_suggestion(index: usize, suggestion: &Suggestion) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "### {}. {}\n", index, suggestion.title);
    let found_in = suggestion
        .provenance
        .iter()
        .map(|p| format!("`{}`", p))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "**Priority:** {} | **Found in:** {}\n", suggestion.priority, found_in);
    let _ = writeln!(out, "{}\n", suggestion.description);

    let details = [
        ("Why", &suggestion.justification),
        ("Suggested changes", &suggestion.specific_changes),
        ("Location", &suggestion.location),
        ("Resources", &suggestion.resources),
    ];
    for (label, value) in details {
        if let Some(value) = value {
            let _ = writeln!(out, "**{}:** {}\n", label, value);
        }
    }
    out
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

impl IssueKind {
    /// Short name used in logs
    pub fn describe(&self) -> String {
        match self {
            IssueKind::Category(category) => category.as_str().to_string(),
            IssueKind::Summary => "summary".to_string(),
        }
    }
}
