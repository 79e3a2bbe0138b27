//! Configuration for analysis runs
//!
//! Defines which files are reviewed, how many are reviewed at once, and
//! what happens with the suggestions afterwards.

use crate::error::AnalyzerError;
use refresher_domain::Category;
use refresher_extractor::ExtractorConfig;
use refresher_processor::ProcessorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Label put on every issue the run files
pub const DEFAULT_ISSUE_LABEL: &str = "refresher";

/// Configuration for an analysis run
///
/// # Examples
///
/// ```
/// use refresher_analyzer::AnalyzerConfig;
///
/// let config = AnalyzerConfig::default();
/// assert_eq!(config.concurrency, 4);
/// assert_eq!(config.max_file_size_mb, 10);
///
/// // Review only, nothing filed on GitHub
/// let config = AnalyzerConfig::review_only();
/// assert!(!config.issues.create_issues);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// File extensions (with leading dot) that are reviewed
    pub supported_extensions: Vec<String>,

    /// Glob patterns matched against the file name and each directory of a path
    pub ignore_patterns: Vec<String>,

    /// Files larger than this are skipped with reason `size_limit`
    pub max_file_size_mb: u64,

    /// Documents with less text than this are skipped with reason `too_short`
    pub min_content_chars: usize,

    /// Documents reviewed at the same time
    pub concurrency: usize,

    /// Budget for the whole run, in seconds
    pub analysis_timeout_secs: u64,

    /// Focus areas sent to the reviewer; empty means all six
    pub focus_areas: Vec<Category>,

    /// Prompt and response handling
    pub extractor: ExtractorConfig,

    /// Issue filing
    pub issues: IssueConfig,
}

/// What to do with a run's suggestions on GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    /// File one issue per category
    pub create_issues: bool,

    /// File a summary issue linking the category issues
    pub create_summary: bool,

    /// Reuse an open issue with the same title instead of filing a duplicate
    pub skip_existing_issues: bool,

    /// Render the issues without filing them
    pub dry_run: bool,

    /// Label on every filed issue; also the label searched for existing ones
    pub label: String,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            create_issues: true,
            create_summary: true,
            skip_existing_issues: true,
            dry_run: false,
            label: DEFAULT_ISSUE_LABEL.to_string(),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            supported_extensions: [".md", ".ipynb", ".rst", ".txt"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            ignore_patterns: ["*.git*", "*.pyc", "__pycache__", "node_modules"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            max_file_size_mb: 10,
            min_content_chars: 100,
            concurrency: 4,
            analysis_timeout_secs: 300,
            focus_areas: Vec::new(),
            extractor: ExtractorConfig::default(),
            issues: IssueConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Review and export only; no issues are filed
    pub fn review_only() -> Self {
        Self {
            issues: IssueConfig {
                create_issues: false,
                create_summary: false,
                ..IssueConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.supported_extensions.is_empty() {
            return Err(AnalyzerError::Configuration(
                "supported_extensions must not be empty".to_string(),
            ));
        }
        if let Some(ext) = self.supported_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(AnalyzerError::Configuration(format!(
                "extension '{}' must start with '.'",
                ext
            )));
        }
        if self.max_file_size_mb == 0 {
            return Err(AnalyzerError::Configuration(
                "max_file_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AnalyzerError::Configuration(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.analysis_timeout_secs == 0 {
            return Err(AnalyzerError::Configuration(
                "analysis_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.issues.label.trim().is_empty() {
            return Err(AnalyzerError::Configuration(
                "issue label must not be empty".to_string(),
            ));
        }
        self.extractor
            .validate()
            .map_err(|e| AnalyzerError::Configuration(e.to_string()))
    }

    /// Overall run budget
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    /// Size limit in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Limits for the format processor
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            max_file_size_bytes: self.max_file_size_bytes(),
            min_content_chars: self.min_content_chars,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, AnalyzerError> {
        toml::from_str(toml_str)
            .map_err(|e| AnalyzerError::Configuration(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, AnalyzerError> {
        toml::to_string_pretty(self)
            .map_err(|e| AnalyzerError::Serialization(format!("Failed to serialize to TOML: {}", e)))
    }
}
