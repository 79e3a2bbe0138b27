//! Prompt rendering for content review

use crate::config::ExtractorConfig;
use crate::types::AnalysisRequest;
use refresher_domain::{Category, Document, DocumentFormat};
use std::fmt::Write;

/// Appended to a body that was cut to fit the budget
pub const TRUNCATION_MARKER: &str = "\n\n... (content truncated for analysis)";

const MAX_LISTED_HEADINGS: usize = 50;
const MAX_LISTED_LINKS: usize = 20;

const PREAMBLE: &str = "You are an expert in high-energy physics and computational science \
education with deep knowledge of current software tools, best practices, and recent \
developments in the field.

TASK: Review the training material below and identify specific places that would benefit \
from an update, while preserving its educational value and structure.";

const CONSTRAINTS: &str = "CONSTRAINTS:
- Do NOT suggest major structural changes to the educational flow
- Preserve the current difficulty level and learning objectives
- Focus on incremental improvements that enhance learning without disrupting the core content
- Prioritize changes that have clear educational benefits";

/// Builds review prompts for documents
///
/// Rendering is deterministic: the same document and focus areas always
/// produce the same prompt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_body_chars: usize,
    sentence_boundary_ratio: f64,
}

impl PromptBuilder {
    /// Create a prompt builder from extractor configuration
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            max_body_chars: config.max_body_chars,
            sentence_boundary_ratio: config.sentence_boundary_ratio,
        }
    }

    /// Render the review prompt for a document
    pub fn build(&self, document: &Document, focus_areas: &[Category]) -> AnalysisRequest {
        let focus_areas = if focus_areas.is_empty() {
            &Category::ALL[..]
        } else {
            focus_areas
        };
        let title = document.title();
        let (body, truncated) = truncate_body(
            &document.analysis_text,
            self.max_body_chars,
            self.sentence_boundary_ratio,
        );

        let mut prompt = String::new();

        // 1. Role and task
        prompt.push_str(PREAMBLE);
        prompt.push_str("\n\n");

        // 2. Document identity
        let _ = writeln!(prompt, "FILE: {}", document.path);
        let _ = writeln!(prompt, "CHAPTER TITLE: {}", title);
        let _ = writeln!(prompt, "FORMAT: {}", document.format);
        let _ = writeln!(prompt, "CONTENT TYPE: {}", document.metadata.kind.as_str());
        prompt.push('\n');

        // 3. Structure
        prompt.push_str(&render_structure(document));
        prompt.push('\n');

        // 4. Body
        prompt.push_str("CONTENT:\n");
        prompt.push_str(&body);
        prompt.push_str("\n\n");

        // 5. Focus areas
        prompt.push_str("ANALYSIS FOCUS:\n");
        for (i, category) in focus_areas.iter().enumerate() {
            let _ = writeln!(
                prompt,
                "{}. **{}** ({}): {}",
                i + 1,
                category.display_name(),
                category.as_str(),
                category.focus_description()
            );
        }
        prompt.push('\n');

        // 6. Constraints and output format
        prompt.push_str(CONSTRAINTS);
        prompt.push_str("\n\n");
        prompt.push_str(&output_format(focus_areas));

        AnalysisRequest {
            document_path: document.path.clone(),
            title,
            prompt,
            truncated,
        }
    }
}

fn render_structure(document: &Document) -> String {
    let meta = &document.metadata;
    let mut out = String::from("STRUCTURE:\n");

    if meta.headings.is_empty() {
        out.push_str("Headings: none\n");
    } else {
        out.push_str("Headings:\n");
        for heading in meta.headings.iter().take(MAX_LISTED_HEADINGS) {
            let indent = "  ".repeat(heading.level.saturating_sub(1) as usize);
            let _ = writeln!(out, "{}- {}", indent, heading.text);
        }
        if meta.headings.len() > MAX_LISTED_HEADINGS {
            let _ = writeln!(out, "  ... and {} more", meta.headings.len() - MAX_LISTED_HEADINGS);
        }
    }

    let _ = writeln!(out, "Code blocks: {}", meta.code_blocks.len());

    if meta.detected_libraries.is_empty() {
        out.push_str("Libraries detected: none\n");
    } else {
        let libs: Vec<&str> = meta.detected_libraries.iter().map(String::as_str).collect();
        let _ = writeln!(out, "Libraries detected: {}", libs.join(", "));
    }

    if !meta.links.is_empty() {
        let _ = writeln!(out, "Links ({}):", meta.links.len());
        for link in meta.links.iter().take(MAX_LISTED_LINKS) {
            let _ = writeln!(out, "- {}", link.target);
        }
    }

    if document.format == DocumentFormat::Notebook {
        if let Some(info) = &meta.notebook {
            let p = &info.progression;
            let _ = writeln!(
                out,
                "Notebook: {} cells, kernel {}, code/markdown ratio {:.2}, {} cells with output",
                p.total_cells,
                info.kernel.as_deref().unwrap_or("unknown"),
                p.code_to_markdown_ratio,
                p.cells_with_output
            );
        }
    }

    out
}

fn output_format(focus_areas: &[Category]) -> String {
    let types: Vec<&str> = focus_areas.iter().map(Category::as_str).collect();
    format!(
        r#"OUTPUT FORMAT:
Provide your analysis as a JSON object with this structure:
{{
  "suggestions": [
    {{
      "title": "Brief descriptive title",
      "type": "{}",
      "priority": "high|medium|low",
      "description": "Clear description of what needs updating and why",
      "justification": "Explanation of benefits and relevance to current practices",
      "specific_changes": "Concrete suggestions for what to change",
      "location": "Specific section, line, or area where change applies",
      "resources": "Helpful links or references (optional)"
    }}
  ],
  "overall_assessment": "Brief summary of content quality and update needs"
}}

Be specific and actionable. Only suggest changes that genuinely improve the educational value or technical accuracy of the content."#,
        types.join("|")
    )
}

/// Cut `text` to at most `budget` characters plus the truncation marker.
///
/// When a sentence ends after `ratio * budget` characters, the cut is made
/// right after it. Returns the text and whether it was truncated.
///
/// # Examples
///
/// ```
/// use refresher_extractor::truncate_body;
///
/// let (text, truncated) = truncate_body("short", 100, 0.8);
/// assert_eq!(text, "short");
/// assert!(!truncated);
///
/// let (text, truncated) = truncate_body("One two three. Four five six", 20, 0.5);
/// assert!(truncated);
/// assert!(text.starts_with("One two three.\n\n..."));
/// ```
pub fn truncate_body(text: &str, budget: usize, ratio: f64) -> (String, bool) {
    let cut = match text.char_indices().nth(budget) {
        Some((byte, _)) => byte,
        None => return (text.to_string(), false),
    };

    let mut kept = &text[..cut];
    if let Some(period) = kept.rfind('.') {
        let chars_before = kept[..period].chars().count();
        if chars_before as f64 > budget as f64 * ratio {
            kept = &kept[..=period];
        }
    }

    (format!("{}{}", kept, TRUNCATION_MARKER), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use refresher_domain::{ContentKind, Heading, StructuralMetadata};

    fn document(body: &str) -> Document {
        let mut metadata = StructuralMetadata {
            headings: vec![
                Heading { level: 1, text: "Docker".into(), position: 1 },
                Heading { level: 2, text: "Volumes".into(), position: 9 },
            ],
            kind: ContentKind::Tutorial,
            ..StructuralMetadata::default()
        };
        metadata.detected_libraries.insert("numpy".into());
        metadata.title = Some("Intro to Docker".into());
        Document {
            path: "_episodes/02-docker.md".into(),
            format: DocumentFormat::Markdown,
            raw_text: body.into(),
            analysis_text: body.into(),
            metadata,
        }
    }

    fn builder(max_body_chars: usize) -> PromptBuilder {
        PromptBuilder::new(&ExtractorConfig {
            max_body_chars,
            ..ExtractorConfig::default()
        })
    }

    #[test]
    fn test_prompt_contains_document_and_focus() {
        let request = builder(10_000).build(&document("Run `docker run`."), &Category::ALL);
        let prompt = &request.prompt;

        assert_eq!(request.document_path, "_episodes/02-docker.md");
        assert_eq!(request.title, "Intro to Docker");
        assert!(!request.truncated);
        assert!(prompt.contains("FILE: _episodes/02-docker.md"));
        assert!(prompt.contains("CHAPTER TITLE: Intro to Docker"));
        assert!(prompt.contains("CONTENT TYPE: tutorial"));
        assert!(prompt.contains("- Docker\n  - Volumes\n"));
        assert!(prompt.contains("Libraries detected: numpy"));
        assert!(prompt.contains("CONTENT:\nRun `docker run`."));
        assert!(prompt.contains("6. **Example Improvements** (example_improvement)"));
        assert!(prompt.contains("\"overall_assessment\""));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let doc = document("Same input.");
        let a = builder(10_000).build(&doc, &Category::ALL);
        let b = builder(10_000).build(&doc, &Category::ALL);
        assert_eq!(a, b);
    }

    #[test]
    fn test_focus_subset() {
        let request = builder(10_000).build(
            &document("x"),
            &[Category::ResourceUpdate, Category::SoftwareUpdate],
        );
        assert!(request.prompt.contains("1. **Resource Updates**"));
        assert!(request.prompt.contains("2. **Software/Tool Updates**"));
        assert!(!request.prompt.contains("Best Practices"));
        assert!(request.prompt.contains("\"type\": \"resource_update|software_update\""));
    }

    #[test]
    fn test_empty_focus_means_all() {
        let request = builder(10_000).build(&document("x"), &[]);
        assert!(request.prompt.contains("6. **"));
    }

    #[test]
    fn test_body_truncated_to_budget() {
        let body = "word ".repeat(100);
        let request = builder(50).build(&document(&body), &Category::ALL);
        assert!(request.truncated);
        assert!(request.prompt.contains(TRUNCATION_MARKER));
        assert!(!request.prompt.contains(&body));
    }

    #[test]
    fn test_truncate_prefers_late_sentence_end() {
        let text = "aaaaaaaaa. bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
        // Period at char 9 is before 80% of 20 chars: hard cut
        let (out, truncated) = truncate_body(text, 20, 0.8);
        assert!(truncated);
        assert_eq!(out, format!("{}{}", &text[..20], TRUNCATION_MARKER));

        let text = "aaaaaaaaaaaaaaaaa. bbbbbbbbbbbbbbbbbbb";
        // Period at char 17 is past 80% of 20 chars: cut after it
        let (out, _) = truncate_body(text, 20, 0.8);
        assert_eq!(out, format!("aaaaaaaaaaaaaaaaa.{}", TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let text = "é".repeat(30);
        let (out, truncated) = truncate_body(&text, 10, 0.8);
        assert!(truncated);
        assert!(out.starts_with(&"é".repeat(10)));
    }
}
