//! Jupyter notebooks (nbformat 4)

use crate::error::ProcessingError;
use crate::imports;
use crate::markdown;
use refresher_domain::{
    CellKind, CodeBlock, CodeComplexity, ContentKind, Document, DocumentFormat, LearningProgression,
    NotebookInfo, StructuralMetadata,
};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

const INTRODUCTION_TERMS: &[&str] = &["introduction", "overview", "getting started"];
const EXERCISE_TERMS: &[&str] = &["exercise", "challenge", "try it", "practice"];
const CONCLUSION_TERMS: &[&str] = &["conclusion", "summary", "wrap up"];
const CONTROL_FLOW: &[&str] = &["def ", "class ", "for ", "while ", "if "];

/// Notebooks with more code cells than this count as code-heavy
const CODE_HEAVY_CELLS: usize = 5;

#[derive(Debug, Deserialize)]
struct RawNotebook {
    cells: Vec<RawCell>,
    #[serde(default)]
    metadata: RawMetadata,
    nbformat: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    title: Option<String>,
    kernelspec: Option<Kernelspec>,
    language_info: Option<LanguageInfo>,
}

#[derive(Debug, Deserialize)]
struct Kernelspec {
    name: Option<String>,
    display_name: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LanguageInfo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: Source,
    #[serde(default)]
    outputs: Vec<serde_json::Value>,
}

/// Cell source: a single string or a list of lines (each keeping its newline)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Source {
    Text(String),
    Lines(Vec<String>),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    fn text(&self) -> String {
        match self {
            Source::Text(text) => text.clone(),
            Source::Lines(lines) => lines.concat(),
        }
    }
}

struct Cell {
    kind: CellKind,
    source: String,
    has_output: bool,
}

/// Parse a notebook document
pub fn process(path: &str, raw_text: &str) -> Result<Document, ProcessingError> {
    let notebook: RawNotebook = serde_json::from_str(raw_text)
        .map_err(|e| ProcessingError::malformed(path, format!("invalid notebook JSON: {}", e)))?;

    if let Some(version) = notebook.nbformat.filter(|v| *v < 4) {
        return Err(ProcessingError::malformed(
            path,
            format!("unsupported nbformat version {}", version),
        ));
    }

    let cells: Vec<Cell> = notebook
        .cells
        .iter()
        .map(|cell| Cell {
            kind: match cell.cell_type.as_str() {
                "markdown" => CellKind::Markdown,
                "code" => CellKind::Code,
                _ => CellKind::Raw,
            },
            source: cell.source.text(),
            has_output: !cell.outputs.is_empty(),
        })
        .collect();

    let kernel = notebook.metadata.kernelspec.as_ref();
    let language = kernel
        .and_then(|k| k.language.clone())
        .or_else(|| notebook.metadata.language_info.as_ref().and_then(|l| l.name.clone()));

    let mut front_matter = BTreeMap::new();
    if let Some(title) = &notebook.metadata.title {
        front_matter.insert("title".to_string(), title.clone());
    }
    if let Some(kernel) = kernel {
        if let Some(name) = &kernel.name {
            front_matter.insert("kernel_name".to_string(), name.clone());
        }
        if let Some(display) = &kernel.display_name {
            front_matter.insert("kernel_display_name".to_string(), display.clone());
        }
    }
    if let Some(language) = &language {
        front_matter.insert("language".to_string(), language.clone());
    }

    let mut headings = Vec::new();
    let mut links = Vec::new();
    let mut code_blocks = Vec::new();
    let mut detected_libraries = BTreeSet::new();
    let mut annotations = Vec::new();

    for (index, cell) in cells.iter().enumerate() {
        match cell.kind {
            CellKind::Markdown => {
                let lines: Vec<(usize, &str)> = cell.source.lines().map(|l| (index, l)).collect();
                let scan = markdown::scan(&lines);
                headings.extend(scan.headings);
                links.extend(scan.links);
            }
            CellKind::Code if !cell.source.trim().is_empty() => {
                let cell_imports = imports::import_lines(&cell.source);
                annotations.push(format!(
                    "<!-- Code Cell {}: Lines: {}, Imports: {} -->",
                    index,
                    cell.source.lines().count(),
                    cell_imports.iter().take(3).copied().collect::<Vec<_>>().join(", ")
                ));
                detected_libraries.extend(imports::libraries(&cell.source));
                code_blocks.push(CodeBlock {
                    language: language.clone(),
                    code: cell.source.clone(),
                    position: index,
                });
            }
            _ => {}
        }
    }

    let markdown_text = cells
        .iter()
        .filter(|c| c.kind == CellKind::Markdown)
        .map(|c| c.source.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut analysis_text = markdown_text.clone();
    if !annotations.is_empty() {
        analysis_text.push_str("\n\n<!-- Code Analysis -->\n");
        for annotation in &annotations {
            analysis_text.push('\n');
            analysis_text.push_str(annotation);
            analysis_text.push('\n');
        }
    }

    let progression = progression(&cells, &markdown_text.to_lowercase());
    let kind = classify(&progression, code_blocks.len());
    let title = notebook.metadata.title.clone().or_else(|| {
        headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.text.clone())
    });

    let metadata = StructuralMetadata {
        headings,
        code_blocks,
        detected_libraries,
        links,
        front_matter,
        title,
        kind,
        line_count: raw_text.lines().count(),
        word_count: analysis_text.split_whitespace().count(),
        notebook: Some(NotebookInfo {
            kernel: kernel.and_then(|k| k.name.clone()),
            language,
            cells: cells.iter().map(|c| c.kind).collect(),
            progression,
        }),
    };

    Ok(Document {
        path: path.to_string(),
        format: DocumentFormat::Notebook,
        raw_text: raw_text.to_string(),
        analysis_text,
        metadata,
    })
}

fn progression(cells: &[Cell], markdown_lower: &str) -> LearningProgression {
    let code_cells = cells.iter().filter(|c| c.kind == CellKind::Code).count();
    let markdown_cells = cells.iter().filter(|c| c.kind == CellKind::Markdown).count();
    let mentions = |terms: &[&str]| terms.iter().any(|t| markdown_lower.contains(t));

    LearningProgression {
        total_cells: cells.len(),
        code_to_markdown_ratio: if markdown_cells > 0 {
            code_cells as f64 / markdown_cells as f64
        } else {
            0.0
        },
        has_introduction: mentions(INTRODUCTION_TERMS),
        has_exercises: mentions(EXERCISE_TERMS),
        has_conclusions: mentions(CONCLUSION_TERMS),
        complexity: cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == CellKind::Code)
            .map(|(i, c)| (i, complexity(&c.source)))
            .collect(),
        cells_with_output: cells
            .iter()
            .filter(|c| c.kind == CellKind::Code && c.has_output)
            .count(),
    }
}

/// Rough complexity of one code cell by non-blank line count
pub fn complexity(code: &str) -> CodeComplexity {
    let lines = code.lines().filter(|l| !l.trim().is_empty()).count();
    match lines {
        0 => CodeComplexity::Empty,
        1..=3 => CodeComplexity::Simple,
        4..=10 if CONTROL_FLOW.iter().any(|k| code.contains(k)) => CodeComplexity::Intermediate,
        4..=10 => CodeComplexity::Simple,
        _ => CodeComplexity::Complex,
    }
}

fn classify(progression: &LearningProgression, code_blocks: usize) -> ContentKind {
    if progression.has_exercises {
        ContentKind::TutorialWithExercises
    } else if progression.has_introduction && progression.has_conclusions {
        ContentKind::CompleteTutorial
    } else if code_blocks > CODE_HEAVY_CELLS {
        ContentKind::CodeHeavyTutorial
    } else if progression.has_introduction {
        ContentKind::Introduction
    } else {
        ContentKind::Notebook
    }
}
