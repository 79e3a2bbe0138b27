//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use refresher_analyzer::{export, AnalysisResult, DocumentStatus, IssueKind, IssueStatus};
use refresher_domain::Priority;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const TITLE_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a finished run.
    pub fn format_result(&self, result: &AnalysisResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(export::to_json(result)?),
            OutputFormat::Table => Ok(self.format_result_table(result)),
        }
    }

    fn format_result_table(&self, result: &AnalysisResult) -> String {
        let mut sections = vec![
            self.colorize(&format!("Repository: {}", result.repository), "cyan"),
            format!("Run: {}  Model: {}", result.run_id, result.model),
        ];
        if let Some(reason) = result.stopped {
            sections.push(self.warning(&format!("Run stopped early ({})", reason.as_str())));
        }

        sections.push(self.documents_table(result));

        if result.suggestions.is_empty() {
            sections.push(self.colorize("No suggestions found.", "yellow"));
        } else {
            sections.push(self.suggestions_table(result));
        }

        if !result.issues.is_empty() {
            sections.push(self.issues_table(result));
        }

        sections.push(result.metrics.summary());
        sections.join("\n\n")
    }

    fn documents_table(&self, result: &AnalysisResult) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Document", "Format", "Status", "Suggestions", "Reason"]);

        for doc in &result.documents {
            builder.push_record(vec![
                doc.path.clone(),
                doc.format.map(|f| f.as_str().to_string()).unwrap_or_default(),
                self.status(doc.status),
                doc.suggestions.to_string(),
                doc.reason.clone().unwrap_or_default(),
            ]);
        }

        self.render(builder)
    }

    fn suggestions_table(&self, result: &AnalysisResult) -> String {
        let mut suggestions: Vec<_> = result.suggestions.iter().collect();
        suggestions.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.title.cmp(&b.title))
        });

        let mut builder = Builder::default();
        builder.push_record(["Priority", "Category", "Title", "Found in"]);
        for suggestion in suggestions {
            builder.push_record(vec![
                self.priority(suggestion.priority),
                suggestion.category.display_name().to_string(),
                shorten(&suggestion.title, TITLE_WIDTH),
                suggestion.provenance.join("\n"),
            ]);
        }

        self.render(builder)
    }

    fn issues_table(&self, result: &AnalysisResult) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Issue", "Status", "Link", "Title"]);
        for issue in &result.issues {
            let kind = match issue.kind {
                IssueKind::Category(category) => category.display_name().to_string(),
                IssueKind::Summary => "Summary".to_string(),
            };
            let status = match issue.status {
                IssueStatus::Created => self.colorize("created", "green"),
                IssueStatus::Existing => self.colorize("existing", "blue"),
                IssueStatus::DryRun => self.colorize("dry run", "cyan"),
                IssueStatus::Failed => self.colorize("failed", "red"),
            };
            let link = issue
                .url
                .clone()
                .or_else(|| issue.error.clone())
                .unwrap_or_default();
            builder.push_record(vec![kind, status, link, shorten(&issue.title, TITLE_WIDTH)]);
        }

        self.render(builder)
    }

    /// Format effective settings.
    pub fn format_settings(&self, rows: &[(String, String)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = rows
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Setting", "Value"]);
                for (name, value) in rows {
                    builder.push_record([name.as_str(), value.as_str()]);
                }
                Ok(self.render(builder))
            }
        }
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn status(&self, status: DocumentStatus) -> String {
        let color = match status {
            DocumentStatus::Succeeded => "green",
            DocumentStatus::Skipped => "yellow",
            DocumentStatus::Failed => "red",
        };
        self.colorize(status.as_str(), color)
    }

    fn priority(&self, priority: Priority) -> String {
        let color = match priority {
            Priority::High => "red",
            Priority::Medium => "yellow",
            Priority::Low => "blue",
        };
        self.colorize(priority.as_str(), color)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use refresher_analyzer::{DocumentReport, IssueOutcome, RunMetrics};
    use refresher_domain::{Category, Suggestion};

    fn result() -> AnalysisResult {
        let suggestions = vec![
            Suggestion::new(Category::SoftwareUpdate, Priority::High, "Update NumPy to 2.0", "", "a.md"),
            Suggestion::new(Category::BestPractice, Priority::Low, "Use a virtual environment", "", "b.md"),
        ];
        let mut metrics = RunMetrics::default();
        metrics.record_suggestions(&suggestions);
        let documents = vec![DocumentReport::skipped("big.ipynb", "size_limit", "too big")];
        for doc in &documents {
            metrics.record_document(doc);
        }

        let mut result = AnalysisResult {
            run_id: Default::default(),
            repository: "https://github.com/o/r".into(),
            branch: None,
            path: None,
            model: "mock".into(),
            started_at: serde_json::from_str("\"2026-03-01T12:00:00Z\"").unwrap(),
            finished_at: serde_json::from_str("\"2026-03-01T12:04:00Z\"").unwrap(),
            stopped: None,
            metrics,
            documents,
            suggestions,
            issues: Vec::new(),
        };
        result.push_issue(IssueOutcome {
            kind: IssueKind::Category(Category::SoftwareUpdate),
            title: "[Refresher] Software and Tool Updates suggestions".into(),
            status: IssueStatus::Created,
            number: Some(3),
            url: Some("https://github.com/o/r/issues/3".into()),
            error: None,
            body: None,
        });
        result
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_result(&result()).unwrap();
        assert!(output.contains("Document"));
        assert!(output.contains("big.ipynb"));
        assert!(output.contains("size_limit"));
        assert!(output.contains("Update NumPy to 2.0"));
        assert!(output.contains("https://github.com/o/r/issues/3"));
        assert!(output.contains("Analysis Summary"));
        assert!(output.find("Update NumPy").unwrap() < output.find("Use a virtual").unwrap());
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_result(&result()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["metrics"]["total_suggestions"], 2);
        assert_eq!(json["documents"][0]["reason"], "size_limit");
    }

    #[test]
    fn test_empty_suggestions() {
        let mut result = result();
        result.suggestions.clear();
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert!(formatter.format_result(&result).unwrap().contains("No suggestions found"));
    }

    #[test]
    fn test_settings_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let rows = vec![("gemini.model".to_string(), "gemini-2.0-flash".to_string())];
        let output = formatter.format_settings(&rows).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["gemini.model"], "gemini-2.0-flash");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("a rather long title", 10), "a rathe...");
    }
}
