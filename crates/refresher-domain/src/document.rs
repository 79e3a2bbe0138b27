//! Training documents and their extracted structure

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Source format of a training file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Markdown lessons (also used for `.rst` and `.txt` text)
    Markdown,

    /// Jupyter notebooks (nbformat JSON)
    Notebook,
}

impl DocumentFormat {
    /// Select the format from a file path's extension
    ///
    /// # Examples
    ///
    /// ```
    /// use refresher_domain::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_path("episodes/01-intro.md"), Some(DocumentFormat::Markdown));
    /// assert_eq!(DocumentFormat::from_path("nb/Tutorial.IPYNB"), Some(DocumentFormat::Notebook));
    /// assert_eq!(DocumentFormat::from_path("fig/plot.png"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "md" | "markdown" | "rst" | "txt" => Some(DocumentFormat::Markdown),
            "ipynb" => Some(DocumentFormat::Notebook),
            _ => None,
        }
    }

    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Markdown => "markdown",
            DocumentFormat::Notebook => "notebook",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One training-module file after format processing
///
/// Immutable once built; consumed by the prompt builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Repository-relative path
    pub path: String,

    /// Source format
    pub format: DocumentFormat,

    /// File content as fetched
    pub raw_text: String,

    /// Text handed to the reviewer (notebooks: markdown cells plus code annotations)
    pub analysis_text: String,

    /// Extracted structure
    pub metadata: StructuralMetadata,
}

impl Document {
    /// Title from front matter or first top-level heading, falling back to the file name
    pub fn title(&self) -> String {
        self.metadata.title.clone().unwrap_or_else(|| {
            self.path
                .rsplit('/')
                .next()
                .unwrap_or(self.path.as_str())
                .to_string()
        })
    }
}

/// Structural metadata extracted from a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralMetadata {
    /// Headings in document order
    pub headings: Vec<Heading>,

    /// Code blocks (fenced blocks or code cells) in document order
    pub code_blocks: Vec<CodeBlock>,

    /// Top-level library names found in import statements
    pub detected_libraries: BTreeSet<String>,

    /// Hyperlinks, kept for resource-update checks
    pub links: Vec<Link>,

    /// Front matter or notebook-level metadata
    pub front_matter: BTreeMap<String, String>,

    /// Document title, if one could be determined
    pub title: Option<String>,

    /// What kind of training material this looks like
    pub kind: ContentKind,

    /// Number of lines in the raw text
    pub line_count: usize,

    /// Number of whitespace-separated words in the analysis text
    pub word_count: usize,

    /// Notebook-only structure
    pub notebook: Option<NotebookInfo>,
}

/// A heading in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,

    /// Heading text without markers
    pub text: String,

    /// 1-based line number (markdown) or cell index (notebook)
    pub position: usize,
}

/// A code block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info-string language, if any
    pub language: Option<String>,

    /// Code without fence markers
    pub code: String,

    /// 1-based line of the opening fence (markdown) or cell index (notebook)
    pub position: usize,
}

/// A hyperlink found in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Link text (the URL itself for bare links)
    pub text: String,

    /// Link target; reference links are recorded as `[ref:<name>]`
    pub target: String,

    /// How the link was written
    pub kind: LinkKind,

    /// 1-based line number (markdown) or cell index (notebook)
    pub line: usize,
}

/// Markdown link syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `[text](url)`
    Inline,

    /// `[text][ref]`
    Reference,

    /// A bare `http(s)://` URL
    Bare,
}

/// Classification of training material
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Exercises with solutions
    TutorialWithExercises,

    /// Exercises without solutions
    Tutorial,

    /// Notebook with introduction and conclusions
    CompleteTutorial,

    /// Notebook with many code cells
    CodeHeavyTutorial,

    /// Markdown with code but no exercises
    CodeExample,

    /// Introductory material
    Introduction,

    /// Plain notebook
    Notebook,

    /// Anything else
    #[default]
    Documentation,

    /// Declared by the author through front matter `type`
    Declared(String),
}

impl ContentKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &str {
        match self {
            ContentKind::TutorialWithExercises => "tutorial_with_exercises",
            ContentKind::Tutorial => "tutorial",
            ContentKind::CompleteTutorial => "complete_tutorial",
            ContentKind::CodeHeavyTutorial => "code_heavy_tutorial",
            ContentKind::CodeExample => "code_example",
            ContentKind::Introduction => "introduction",
            ContentKind::Notebook => "notebook",
            ContentKind::Documentation => "documentation",
            ContentKind::Declared(kind) => kind.as_str(),
        }
    }
}

/// Notebook-specific structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotebookInfo {
    /// Kernel name from `metadata.kernelspec`
    pub kernel: Option<String>,

    /// Programming language of the kernel
    pub language: Option<String>,

    /// Cell kinds in notebook order
    pub cells: Vec<CellKind>,

    /// Learning-progression analysis
    pub progression: LearningProgression,
}

/// Notebook cell type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Markdown cell
    Markdown,
    /// Code cell
    Code,
    /// Raw cell
    Raw,
}

/// How a notebook builds up its material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearningProgression {
    /// Total number of cells
    pub total_cells: usize,

    /// Code cells divided by markdown cells (0 when there is no markdown)
    pub code_to_markdown_ratio: f64,

    /// Markdown mentions an introduction or overview
    pub has_introduction: bool,

    /// Markdown mentions exercises or challenges
    pub has_exercises: bool,

    /// Markdown mentions a conclusion or summary
    pub has_conclusions: bool,

    /// Complexity per code cell as (cell index, complexity)
    pub complexity: Vec<(usize, CodeComplexity)>,

    /// Code cells that carry outputs
    pub cells_with_output: usize,
}

/// Rough size/shape of a code cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CodeComplexity {
    /// No code
    Empty,
    /// Up to three lines, or short straight-line code
    Simple,
    /// Up to ten lines with control flow or definitions
    Intermediate,
    /// Longer than ten lines
    Complex,
}

impl CodeComplexity {
    /// Get the complexity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeComplexity::Empty => "empty",
            CodeComplexity::Simple => "simple",
            CodeComplexity::Intermediate => "intermediate",
            CodeComplexity::Complex => "complex",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path("a/b.rst"), Some(DocumentFormat::Markdown));
        assert_eq!(DocumentFormat::from_path("notes.TXT"), Some(DocumentFormat::Markdown));
        assert_eq!(DocumentFormat::from_path("Makefile"), None);
        assert_eq!(DocumentFormat::from_path("src/main.py"), None);
    }

    #[test]
    fn test_title_falls_back_to_file_name() {
        let doc = Document {
            path: "episodes/03-containers.md".to_string(),
            format: DocumentFormat::Markdown,
            raw_text: String::new(),
            analysis_text: String::new(),
            metadata: StructuralMetadata::default(),
        };
        assert_eq!(doc.title(), "03-containers.md");
    }

    #[test]
    fn test_declared_kind_name() {
        assert_eq!(ContentKind::Declared("lab".to_string()).as_str(), "lab");
        assert_eq!(ContentKind::default().as_str(), "documentation");
    }
}
