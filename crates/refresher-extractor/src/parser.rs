//! Strict parsing of structured reviewer output

use crate::error::ExtractorError;
use crate::types::{ParsedResponse, RawCandidate};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse a response as JSON suggestions.
///
/// Accepts a bare array of suggestion objects, the
/// `{"suggestions": [...], "overall_assessment": ...}` envelope, or a single
/// suggestion object, optionally wrapped in a Markdown code fence. Entries
/// without a usable title are counted as rejected.
pub fn parse_strict(response: &str) -> Result<ParsedResponse, ExtractorError> {
    let json = extract_json(response)?;

    let (items, overall_assessment) = match json {
        Value::Array(items) => (items, None),
        Value::Object(mut obj) => match obj.remove("suggestions") {
            Some(Value::Array(items)) => (items, obj.get("overall_assessment").and_then(text_of)),
            Some(_) => {
                return Err(ExtractorError::InvalidFormat(
                    "'suggestions' is not an array".to_string(),
                ))
            }
            None if obj.contains_key("title") => (vec![Value::Object(obj)], None),
            None => {
                return Err(ExtractorError::InvalidFormat(
                    "Expected a JSON array or a 'suggestions' object".to_string(),
                ))
            }
        },
        other => {
            return Err(ExtractorError::InvalidFormat(format!(
                "Expected a JSON array or object, got {}",
                kind_of(&other)
            )))
        }
    };

    let mut parsed = ParsedResponse {
        overall_assessment,
        ..ParsedResponse::default()
    };
    for (idx, item) in items.iter().enumerate() {
        match parse_candidate(item) {
            Ok(candidate) => parsed.candidates.push(candidate),
            Err(e) => {
                warn!("Suggestion {} rejected: {}", idx, e);
                parsed.rejected += 1;
            }
        }
    }

    Ok(parsed)
}

/// Find the JSON payload in a response, handling Markdown code fences and
/// surrounding prose.
fn extract_json(response: &str) -> Result<Value, ExtractorError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ExtractorError::InvalidFormat("Empty response".to_string()));
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str(fenced) {
            return Ok(value);
        }
    }

    // Prose around the payload: take the outermost bracketed span
    let start = trimmed.find(['[', '{']);
    let end = trimmed.rfind([']', '}']);
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            let candidate = &trimmed[start..=end];
            match serde_json::from_str(candidate) {
                Ok(value) => return Ok(value),
                Err(e) => debug!("Bracketed span is not JSON: {}", e),
            }
        }
    }

    Err(ExtractorError::InvalidFormat(
        "No JSON payload found in response".to_string(),
    ))
}

/// Content of the first ``` fenced block
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```").unwrap_or(body.len());
    Some(body[..close].trim())
}

fn parse_candidate(item: &Value) -> Result<RawCandidate, String> {
    let obj = item
        .as_object()
        .ok_or_else(|| format!("Expected an object, got {}", kind_of(item)))?;

    let title = field(obj, &["title", "name", "summary"])
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Missing or empty 'title'".to_string())?;

    let specific_changes = field(obj, &["specific_changes", "changes", "suggested_change"]);
    let description = field(obj, &["description", "details", "rationale"])
        .or_else(|| specific_changes.clone())
        .unwrap_or_default();

    Ok(RawCandidate {
        category: field(obj, &["category", "type", "focus_area"]),
        priority: field(obj, &["priority", "severity", "importance"]),
        title,
        description,
        justification: field(obj, &["justification", "why"]),
        specific_changes,
        location: field(obj, &["location", "section"]),
        resources: field(obj, &["resources", "references", "links"]),
    })
}

/// First present, non-empty field among `keys`, rendered as text
fn field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| obj.get(*key).and_then(text_of))
}

/// Render a JSON value as text; arrays become one item per line
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(text_of)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array() {
        let parsed = parse_strict(
            r#"[{"category":"software_update","title":"Update NumPy to 2.0","priority":"high","description":"NumPy 2.0 is out"}]"#,
        )
        .unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        let c = &parsed.candidates[0];
        assert_eq!(c.category.as_deref(), Some("software_update"));
        assert_eq!(c.priority.as_deref(), Some("high"));
        assert_eq!(c.title, "Update NumPy to 2.0");
        assert_eq!(c.description, "NumPy 2.0 is out");
        assert_eq!(parsed.rejected, 0);
    }

    #[test]
    fn test_envelope_with_type_key() {
        let response = r#"{
            "suggestions": [
                {"title": "Fix ROOT primer link", "type": "resource_update", "priority": "low",
                 "description": "Moved", "location": "Setup", "resources": ["https://root.cern", "https://cern.ch"]}
            ],
            "overall_assessment": "Solid lesson"
        }"#;
        let parsed = parse_strict(response).unwrap();
        let c = &parsed.candidates[0];
        assert_eq!(c.category.as_deref(), Some("resource_update"));
        assert_eq!(c.location.as_deref(), Some("Setup"));
        assert_eq!(c.resources.as_deref(), Some("https://root.cern\nhttps://cern.ch"));
        assert_eq!(parsed.overall_assessment.as_deref(), Some("Solid lesson"));
    }

    #[test]
    fn test_code_fence_stripped() {
        let response = "Here you go:\n```json\n[{\"title\": \"A\", \"type\": \"best_practice\"}]\n```\nThanks";
        let parsed = parse_strict(response).unwrap();
        assert_eq!(parsed.candidates[0].title, "A");
    }

    #[test]
    fn test_prose_around_json() {
        let response = "My analysis: {\"suggestions\": []} end.";
        let parsed = parse_strict(response).unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_untitled_entries_rejected() {
        let parsed = parse_strict(r#"[{"title": "  "}, {"description": "x"}, 3, {"title": "Ok"}]"#).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.rejected, 3);
    }

    #[test]
    fn test_description_falls_back_to_changes() {
        let parsed = parse_strict(r#"[{"title": "T", "specific_changes": "Use uv"}]"#).unwrap();
        assert_eq!(parsed.candidates[0].description, "Use uv");
    }

    #[test]
    fn test_single_object() {
        let parsed = parse_strict(r#"{"title": "Lone", "priority": 1}"#).unwrap();
        assert_eq!(parsed.candidates[0].priority.as_deref(), Some("1"));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_strict("This is not JSON").is_err());
        assert!(parse_strict("").is_err());
        assert!(parse_strict("\"just a string\"").is_err());
        assert!(parse_strict(r#"{"suggestions": "none"}"#).is_err());
        assert!(parse_strict("[{\"title\": \"truncated").is_err());
    }
}
