//! Markdown lessons
//!
//! Line-oriented scan: front matter, ATX headings, fenced code blocks and
//! links. Headings and links inside code blocks are not counted.

use crate::error::ProcessingError;
use crate::imports;
use refresher_domain::{
    CodeBlock, ContentKind, Document, DocumentFormat, Heading, Link, LinkKind, StructuralMetadata,
};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.+)$").expect("valid regex"));

static INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([^\]]+)\]\(\s*<?([^)\s>]+)>?(?:\s+["'][^"']*["'])?\s*\)"#)
        .expect("valid regex")
});

static REFERENCE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\[([^\]]*)\]").expect("valid regex"));

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'()\[\]{}|\\^`]+"#).expect("valid regex")
});

static KRAMDOWN_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{:\s*\.language-([A-Za-z0-9_+-]+)\s*\}\s*$").expect("valid regex")
});

/// Parse a Markdown (or plain text) document
pub fn process(path: &str, raw_text: &str) -> Result<Document, ProcessingError> {
    if raw_text.contains('\0') {
        return Err(ProcessingError::malformed(path, "binary content in text file"));
    }

    let (front_matter, body_start) = front_matter(raw_text);
    let lines: Vec<(usize, &str)> = raw_text
        .lines()
        .enumerate()
        .skip(body_start)
        .map(|(i, line)| (i + 1, line))
        .collect();

    let scan = scan(&lines);
    let mut detected_libraries = BTreeSet::new();
    for block in &scan.code_blocks {
        detected_libraries.extend(imports::libraries(&block.code));
    }

    let title = front_matter.get("title").cloned().or_else(|| {
        scan.headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.text.clone())
    });
    let kind = classify(&front_matter, &scan.headings, &scan.code_blocks);

    let metadata = StructuralMetadata {
        headings: scan.headings,
        code_blocks: scan.code_blocks,
        detected_libraries,
        links: scan.links,
        front_matter,
        title,
        kind,
        line_count: raw_text.lines().count(),
        word_count: raw_text.split_whitespace().count(),
        notebook: None,
    };

    Ok(Document {
        path: path.to_string(),
        format: DocumentFormat::Markdown,
        raw_text: raw_text.to_string(),
        analysis_text: raw_text.to_string(),
        metadata,
    })
}

/// Structure found by [`scan`]
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub headings: Vec<Heading>,
    pub code_blocks: Vec<CodeBlock>,
    pub links: Vec<Link>,
}

struct OpenFence<'a> {
    marker: char,
    len: usize,
    language: Option<String>,
    start: usize,
    lines: Vec<&'a str>,
}

/// Scan numbered lines for headings, fenced code blocks and links.
///
/// An unterminated fence runs to the end of the input.
pub(crate) fn scan(lines: &[(usize, &str)]) -> Scan {
    let mut out = Scan::default();
    let mut fence: Option<OpenFence> = None;

    for (idx, &(number, line)) in lines.iter().enumerate() {
        if let Some(open) = fence.as_mut() {
            if closes(line, open.marker, open.len) {
                let mut language = open.language.take();
                if language.is_none() {
                    language = lines
                        .get(idx + 1)
                        .and_then(|(_, next)| KRAMDOWN_LANGUAGE.captures(next))
                        .map(|c| c[1].to_lowercase());
                }
                out.code_blocks.push(CodeBlock {
                    language,
                    code: open.lines.join("\n"),
                    position: open.start,
                });
                fence = None;
            } else {
                open.lines.push(line);
            }
            continue;
        }

        if let Some((marker, len, info)) = opens(line) {
            fence = Some(OpenFence {
                marker,
                len,
                language: info
                    .split_whitespace()
                    .next()
                    .map(|lang| lang.trim_start_matches('{').trim_start_matches('.').to_lowercase())
                    .filter(|lang| !lang.is_empty()),
                start: number,
                lines: Vec::new(),
            });
            continue;
        }

        if let Some(heading) = heading(line, number) {
            out.headings.push(heading);
        }
        out.links.extend(links(line, number));
    }

    if let Some(open) = fence {
        tracing::debug!(line = open.start, "Unterminated code fence runs to end of document");
        out.code_blocks.push(CodeBlock {
            language: open.language,
            code: open.lines.join("\n"),
            position: open.start,
        });
    }

    out
}

/// Split off `---` front matter; returns the key/value pairs and the index of
/// the first body line.
fn front_matter(raw_text: &str) -> (BTreeMap<String, String>, usize) {
    let mut map = BTreeMap::new();
    let mut lines = raw_text.lines();
    if lines.next().map(str::trim_end) != Some("---") {
        return (map, 0);
    }

    let mut pairs = Vec::new();
    for (i, line) in lines.enumerate() {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            for (key, value) in pairs {
                map.insert(key, value);
            }
            return (map, i + 2);
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() && !key.starts_with(char::is_whitespace) && !key.starts_with('-') {
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                pairs.push((key.to_string(), value.to_string()));
            }
        }
    }

    // No closing marker: not front matter after all
    (map, 0)
}

fn opens(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let info = trimmed[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some((marker, len, info))
}

fn closes(line: &str, marker: char, len: usize) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let run = trimmed.chars().take_while(|c| *c == marker).count();
    run >= len && trimmed[run * marker.len_utf8()..].trim().is_empty()
}

fn heading(line: &str, number: usize) -> Option<Heading> {
    let caps = HEADING.captures(line)?;
    let level = caps[1].len() as u8;
    let mut text = caps[2].trim();

    // Optional closing sequence: "## Title ##"
    let stripped = text.trim_end_matches('#');
    if stripped.len() != text.len() && (stripped.is_empty() || stripped.ends_with([' ', '\t'])) {
        text = stripped.trim_end();
    }
    if text.is_empty() {
        return None;
    }

    Some(Heading {
        level,
        text: text.to_string(),
        position: number,
    })
}

fn links(line: &str, number: usize) -> Vec<Link> {
    let mut found = Vec::new();
    let mut inline_spans = Vec::new();

    for caps in INLINE_LINK.captures_iter(line) {
        if let Some(whole) = caps.get(0) {
            inline_spans.push(whole.range());
        }
        found.push(Link {
            text: caps[1].to_string(),
            target: caps[2].to_string(),
            kind: LinkKind::Inline,
            line: number,
        });
    }

    for caps in REFERENCE_LINK.captures_iter(line) {
        let name = if caps[2].is_empty() { &caps[1] } else { &caps[2] };
        found.push(Link {
            text: caps[1].to_string(),
            target: format!("[ref:{}]", name),
            kind: LinkKind::Reference,
            line: number,
        });
    }

    for m in BARE_URL.find_iter(line) {
        if inline_spans.iter().any(|span| span.contains(&m.start())) {
            continue;
        }
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        found.push(Link {
            text: url.to_string(),
            target: url.to_string(),
            kind: LinkKind::Bare,
            line: number,
        });
    }

    found
}

fn classify(
    front_matter: &BTreeMap<String, String>,
    headings: &[Heading],
    code_blocks: &[CodeBlock],
) -> ContentKind {
    if let Some(kind) = front_matter.get("type").filter(|t| !t.is_empty()) {
        return ContentKind::Declared(kind.clone());
    }

    let mentions = |words: &[&str]| {
        headings.iter().any(|h| {
            let text = h.text.to_lowercase();
            words.iter().any(|w| text.contains(w))
        })
    };

    let has_exercises = mentions(&["exercise", "challenge"]);
    let has_solutions = mentions(&["solution", "answer"]);

    if has_exercises && has_solutions {
        ContentKind::TutorialWithExercises
    } else if has_exercises {
        ContentKind::Tutorial
    } else if !code_blocks.is_empty() {
        ContentKind::CodeExample
    } else if mentions(&["introduction"]) {
        ContentKind::Introduction
    } else {
        ContentKind::Documentation
    }
}
