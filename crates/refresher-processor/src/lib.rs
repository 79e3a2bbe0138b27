//! Refresher Format Processor
//!
//! Turns the raw text of a training file into a [`Document`] with its
//! structural metadata: headings, code blocks, imported libraries, links and a
//! content-kind classification.
//!
//! # Formats
//!
//! - **Markdown** (`.md`, `.rst`, `.txt`): front matter, ATX headings, fenced
//!   code blocks, inline/reference/bare links
//! - **Notebook** (`.ipynb`): nbformat 4 cells, kernel metadata, imports,
//!   learning progression
//!
//! Processing is pure. Failures are reported as [`ProcessingError`] tagged
//! with the document path so the caller can skip that document.
//!
//! # Example
//!
//! ```
//! use refresher_domain::DocumentFormat;
//! use refresher_processor::process;
//!
//! let doc = process("intro.md", "# Intro\n\n```python\nimport numpy\n```\n", DocumentFormat::Markdown).unwrap();
//! assert_eq!(doc.metadata.headings.len(), 1);
//! assert!(doc.metadata.detected_libraries.contains("numpy"));
//! ```

#![warn(missing_docs)]

mod error;
pub mod imports;
pub mod markdown;
pub mod notebook;

pub use error::ProcessingError;

use refresher_domain::{Document, DocumentFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Process raw text in the given format
pub fn process(path: &str, raw_text: &str, format: DocumentFormat) -> Result<Document, ProcessingError> {
    match format {
        DocumentFormat::Markdown => markdown::process(path, raw_text),
        DocumentFormat::Notebook => notebook::process(path, raw_text),
    }
}

/// Limits applied around format processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Files larger than this are rejected before parsing
    pub max_file_size_bytes: u64,

    /// Documents with less analysis text than this are not worth reviewing
    pub min_content_chars: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
            min_content_chars: 100,
        }
    }
}

/// Format processor with size and content limits
#[derive(Debug, Clone, Default)]
pub struct FormatProcessor {
    config: ProcessorConfig,
}

impl FormatProcessor {
    /// Create a processor with the given limits
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// Get the configured limits
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Reject files over the size limit without reading their content
    pub fn check_size(&self, path: &str, size: u64) -> Result<(), ProcessingError> {
        if size > self.config.max_file_size_bytes {
            return Err(ProcessingError::SizeLimit {
                path: path.to_string(),
                size,
                limit: self.config.max_file_size_bytes,
            });
        }
        Ok(())
    }

    /// Process a file, selecting the format from its extension.
    ///
    /// Applies the size limit to the text and the minimum-content check to the
    /// resulting analysis text.
    pub fn process(&self, path: &str, raw_text: &str) -> Result<Document, ProcessingError> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| ProcessingError::Unsupported {
            path: path.to_string(),
        })?;
        self.check_size(path, raw_text.len() as u64)?;

        let document = process(path, raw_text, format)?;

        let chars = document.analysis_text.trim().chars().count();
        if chars < self.config.min_content_chars {
            return Err(ProcessingError::TooShort {
                path: path.to_string(),
                chars,
                min: self.config.min_content_chars,
            });
        }

        debug!(
            path = %path,
            format = %format,
            headings = document.metadata.headings.len(),
            code_blocks = document.metadata.code_blocks.len(),
            libraries = document.metadata.detected_libraries.len(),
            "Processed document"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_markdown() -> String {
        format!("# Lesson\n\n{}", "Containers package software with its dependencies. ".repeat(5))
    }

    #[test]
    fn test_dispatch_by_extension() {
        let processor = FormatProcessor::default();
        let doc = processor.process("episodes/01.md", &long_markdown()).unwrap();
        assert_eq!(doc.format, DocumentFormat::Markdown);

        let doc = processor.process("notes.rst", &long_markdown()).unwrap();
        assert_eq!(doc.format, DocumentFormat::Markdown);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FormatProcessor::default().process("plot.png", "x").unwrap_err();
        assert_eq!(err.reason(), "unsupported_format");
    }

    #[test]
    fn test_size_limit() {
        let processor = FormatProcessor::new(ProcessorConfig {
            max_file_size_bytes: 50,
            min_content_chars: 0,
        });
        let err = processor.process("big.md", &long_markdown()).unwrap_err();
        assert_eq!(err.reason(), "size_limit");
        assert!(processor.check_size("small.md", 50).is_ok());
        assert!(processor.check_size("big.md", 51).is_err());
    }

    #[test]
    fn test_too_short() {
        let err = FormatProcessor::default().process("stub.md", "# TODO\n").unwrap_err();
        match err {
            ProcessingError::TooShort { chars, min, .. } => {
                assert_eq!(chars, 6);
                assert_eq!(min, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.max_file_size_bytes, 10_485_760);
        assert_eq!(config.min_content_chars, 100);
    }
}
