//! Fallback parsers for responses that are not structured output

use crate::types::{ParsedResponse, RawCandidate};
use refresher_domain::{Category, Priority};

/// Strategy used when strict JSON parsing fails
///
/// Implementations turn free-form reviewer text into candidate suggestions.
/// They must never fail; text with nothing usable yields an empty result.
pub trait FallbackParser: Send + Sync {
    /// Strategy name used in logs
    fn name(&self) -> &'static str;

    /// Extract candidates from free-form text
    fn parse(&self, response: &str) -> ParsedResponse;
}

/// Fallback that finds nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl FallbackParser for NoFallback {
    fn name(&self) -> &'static str {
        "none"
    }

    fn parse(&self, _response: &str) -> ParsedResponse {
        ParsedResponse::default()
    }
}

/// Line-oriented heuristic over bullet lists
///
/// - Headings (`## Software Updates`, `**Best practices**`, `Resources:`) that
///   mention a category keyword set the category for the bullets below them
/// - Each bullet (`-`, `*`, `+`, `•`, `1.`, `1)`) becomes one candidate;
///   the text before the first `: ` is the title
/// - Priority comes from a leading `[high]`/`(low)` tag or a
///   `high priority`/`priority: high` phrase
/// - Indented lines continue the previous bullet's description
///
/// Bullets with no category context and no category keyword are rejected.
#[derive(Debug, Clone)]
pub struct LenientLineParser {
    max_title_chars: usize,
}

impl LenientLineParser {
    /// Create a lenient parser that cuts titles at `max_title_chars`
    pub fn new(max_title_chars: usize) -> Self {
        Self { max_title_chars }
    }
}

impl Default for LenientLineParser {
    fn default() -> Self {
        Self::new(200)
    }
}

impl FallbackParser for LenientLineParser {
    fn name(&self) -> &'static str {
        "lenient_lines"
    }

    fn parse(&self, response: &str) -> ParsedResponse {
        let mut parsed = ParsedResponse::default();
        let mut context: Option<String> = None;
        let mut current: Option<RawCandidate> = None;
        let mut in_fence = false;

        for line in response.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                flush(&mut parsed, &mut current);
                continue;
            }
            if in_fence || trimmed.is_empty() {
                continue;
            }

            if let Some(item) = bullet_text(trimmed) {
                flush(&mut parsed, &mut current);
                match self.candidate(item, context.as_deref()) {
                    Some(candidate) => current = Some(candidate),
                    None => parsed.rejected += 1,
                }
            } else if let Some(heading) = heading_text(trimmed) {
                flush(&mut parsed, &mut current);
                context = Category::from_keywords(heading).map(|_| heading.to_string());
            } else if line.starts_with([' ', '\t']) && current.is_some() {
                if let Some(candidate) = current.as_mut() {
                    continue_candidate(candidate, trimmed);
                }
            } else {
                flush(&mut parsed, &mut current);
            }
        }
        flush(&mut parsed, &mut current);

        parsed
    }
}

impl LenientLineParser {
    fn candidate(&self, item: &str, context: Option<&str>) -> Option<RawCandidate> {
        let (priority, item) = take_priority(item);
        let (label, rest) = take_label(item);

        let category = label
            .or_else(|| context.map(str::to_string))
            .or_else(|| Category::from_keywords(rest).map(|c| c.as_str().to_string()))?;

        let (title, description) = match rest.split_once(": ") {
            Some((head, tail)) if !strip_emphasis(head).is_empty() => {
                (strip_emphasis(head), tail.trim().to_string())
            }
            _ => (title_from_sentence(rest), rest.trim().to_string()),
        };
        if title.is_empty() {
            return None;
        }

        Some(RawCandidate {
            category: Some(category),
            priority,
            title: title.chars().take(self.max_title_chars).collect(),
            description: if description.is_empty() { title.clone() } else { description },
            ..RawCandidate::default()
        })
    }
}

fn flush(parsed: &mut ParsedResponse, current: &mut Option<RawCandidate>) {
    if let Some(candidate) = current.take() {
        parsed.candidates.push(candidate);
    }
}

fn bullet_text(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && digits <= 3 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

fn heading_text(line: &str) -> Option<&str> {
    if line.starts_with('#') {
        return Some(line.trim_start_matches('#').trim());
    }
    if line.len() > 4 && line.starts_with("**") && line.ends_with("**") {
        return Some(line.trim_matches('*').trim());
    }
    if line.ends_with(':') && line.chars().count() <= 80 {
        return Some(line.trim_end_matches(':').trim());
    }
    None
}

fn continue_candidate(candidate: &mut RawCandidate, line: &str) {
    let lower = line.to_lowercase();
    if let Some(value) = lower.strip_prefix("priority:") {
        if Priority::parse(value).is_some() {
            candidate.priority = Some(value.trim().to_string());
            return;
        }
    }
    for prefix in ["type:", "category:"] {
        if lower.starts_with(prefix) {
            candidate.category = Some(line[prefix.len()..].trim().to_string());
            return;
        }
    }
    if !candidate.description.is_empty() {
        candidate.description.push(' ');
    }
    candidate.description.push_str(line);
}

/// Leading `[high]`/`(low)` tag, or a `high priority` / `priority: high` phrase
fn take_priority(item: &str) -> (Option<String>, &str) {
    for (open, close) in [('[', ']'), ('(', ')')] {
        if let Some(rest) = item.strip_prefix(open) {
            if let Some((tag, after)) = rest.split_once(close) {
                if Priority::parse(tag).is_some() {
                    return (Some(tag.trim().to_string()), after.trim_start());
                }
            }
        }
    }

    let lower = item.to_lowercase();
    if let Some(idx) = lower.find("priority") {
        let after = lower[idx + "priority".len()..]
            .trim_start_matches([':', '=', '-', ' ', '*'])
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .filter(|w| Priority::parse(w).is_some());
        let before = lower[..idx]
            .trim_end_matches([' ', '(', '[', '*', '-'])
            .rsplit(|c: char| !c.is_alphanumeric())
            .next()
            .filter(|w| Priority::parse(w).is_some());
        if let Some(word) = after.or(before) {
            return (Some(word.to_string()), item);
        }
    }

    (None, item)
}

/// Short category label before a colon (`Software update: ...`) or a
/// leading `[software_update]` tag
fn take_label(item: &str) -> (Option<String>, &str) {
    if let Some(rest) = item.strip_prefix('[') {
        if let Some((tag, after)) = rest.split_once(']') {
            if Category::parse(tag).is_some() {
                return (Some(tag.to_string()), after.trim_start());
            }
        }
    }

    if let Some((head, tail)) = item.split_once(": ") {
        let label = strip_emphasis(head);
        let words = label.split_whitespace().count();
        if (1..=3).contains(&words)
            && (Category::parse(&label).is_some() || Category::from_keywords(&label).is_some())
            && !tail.trim().is_empty()
        {
            return (Some(label), tail.trim_start());
        }
    }

    (None, item)
}

fn strip_emphasis(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '*' || c == '_' || c == '`')
        .trim()
        .to_string()
}

/// First sentence (or clause before ` - `) of a bullet
fn title_from_sentence(text: &str) -> String {
    let text = text.trim();
    let end = [". ", " - ", " — "]
        .iter()
        .filter_map(|sep| text.find(sep))
        .min()
        .unwrap_or(text.len());
    strip_emphasis(text[..end].trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVIEW: &str = "Here are my suggestions:

## Software Updates
- **Update NumPy to 2.0**: The lesson pins numpy 1.21. (high priority)
- Replace `pip install root` with conda-forge instructions

## Resource Updates
1. [low] Fix broken link to the ROOT primer: the URL moved.
   It now lives at root.cern/primer.

Overall the lesson is solid.
";

    #[test]
    fn test_bullets_under_category_headings() {
        let parsed = LenientLineParser::default().parse(REVIEW);
        assert_eq!(parsed.candidates.len(), 3);
        assert_eq!(parsed.rejected, 0);

        let first = &parsed.candidates[0];
        assert_eq!(first.category.as_deref(), Some("Software Updates"));
        assert_eq!(first.priority.as_deref(), Some("high"));
        assert_eq!(first.title, "Update NumPy to 2.0");
        assert!(first.description.starts_with("The lesson pins numpy 1.21."));

        let second = &parsed.candidates[1];
        assert_eq!(second.priority, None);
        assert_eq!(
            second.title,
            "Replace `pip install root` with conda-forge instructions"
        );

        let third = &parsed.candidates[2];
        assert_eq!(third.category.as_deref(), Some("Resource Updates"));
        assert_eq!(third.priority.as_deref(), Some("low"));
        assert_eq!(third.title, "Fix broken link to the ROOT primer");
        assert_eq!(
            third.description,
            "the URL moved. It now lives at root.cern/primer."
        );
    }

    #[test]
    fn test_inline_label() {
        let parsed = LenientLineParser::default().parse("* Best practice: Use virtual environments");
        let c = &parsed.candidates[0];
        assert_eq!(c.category.as_deref(), Some("Best practice"));
        assert_eq!(c.title, "Use virtual environments");
    }

    #[test]
    fn test_keyword_in_bullet_without_context() {
        let parsed = LenientLineParser::default().parse("- The matplotlib version shown is outdated");
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].category.as_deref(), Some("software_update"));
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let parsed = LenientLineParser::default().parse("This is not JSON\n- just a list\n- of words");
        assert!(parsed.candidates.is_empty());
        assert_eq!(parsed.rejected, 2);

        let parsed = LenientLineParser::default().parse("");
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_code_fences_ignored() {
        let text = "## Software Updates\n```\n- not a bullet\n```\n- Upgrade ROOT";
        let parsed = LenientLineParser::default().parse(text);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].title, "Upgrade ROOT");
    }

    #[test]
    fn test_continuation_metadata() {
        let text = "## Examples\n- Add an uproot exercise\n  Priority: high\n  Type: example_improvement";
        let parsed = LenientLineParser::default().parse(text);
        let c = &parsed.candidates[0];
        assert_eq!(c.priority.as_deref(), Some("high"));
        assert_eq!(c.category.as_deref(), Some("example_improvement"));
    }

    #[test]
    fn test_no_fallback() {
        assert!(NoFallback.parse(REVIEW).candidates.is_empty());
    }
}
