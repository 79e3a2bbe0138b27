//! Choosing which repository files are reviewed

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use refresher_domain::SourceEntry;
use tracing::{debug, warn};

/// Files picked for review, plus the ones too large to review
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Files to review, in path order
    pub documents: Vec<SourceEntry>,

    /// Supported files over the size limit, in path order
    pub oversize: Vec<SourceEntry>,
}

/// Filters a repository listing by extension, ignore patterns and size
#[derive(Debug, Clone)]
pub struct FileSelector {
    extensions: Vec<String>,
    ignore: GlobSet,
    max_size: u64,
}

impl FileSelector {
    /// Build a selector from run configuration
    ///
    /// # Errors
    ///
    /// Returns `AnalyzerError::Configuration` when an ignore pattern is not a
    /// valid glob.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                AnalyzerError::Configuration(format!("Invalid ignore pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| AnalyzerError::Configuration(format!("Invalid ignore patterns: {}", e)))?;

        Ok(Self {
            extensions: config
                .supported_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            ignore,
            max_size: config.max_file_size_bytes(),
        })
    }

    /// Whether the path has a supported extension
    pub fn is_supported(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Whether the file name or any directory on the path matches an ignore pattern
    pub fn is_ignored(&self, path: &str) -> bool {
        path.split('/')
            .filter(|component| !component.is_empty())
            .any(|component| self.ignore.is_match(component))
    }

    /// Split a listing into documents to review and oversize files
    pub fn select(&self, entries: Vec<SourceEntry>) -> Selection {
        let mut selection = Selection::default();

        for entry in entries {
            if !self.is_supported(&entry.path) {
                continue;
            }
            if self.is_ignored(&entry.path) {
                debug!(path = %entry.path, "Ignored");
                continue;
            }
            if entry.size > self.max_size {
                warn!(
                    path = %entry.path,
                    size_mb = %format!("{:.1}", entry.size as f64 / (1024.0 * 1024.0)),
                    "Skipping large file"
                );
                selection.oversize.push(entry);
                continue;
            }
            selection.documents.push(entry);
        }

        selection.documents.sort_by(|a, b| a.path.cmp(&b.path));
        selection.oversize.sort_by(|a, b| a.path.cmp(&b.path));
        selection
    }
}
