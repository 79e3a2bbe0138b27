//! Response-to-suggestion extraction

use crate::config::{ExtractorConfig, FallbackMode};
use crate::fallback::{FallbackParser, LenientLineParser, NoFallback};
use crate::parser::parse_strict;
use crate::types::{ExtractionReport, ParseStrategy, ParsedResponse, RawCandidate};
use refresher_domain::{Category, Priority, Suggestion, FALLBACK_CATEGORY};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Turns reviewer responses into normalized suggestions
///
/// Extraction never fails: a response with nothing usable in it yields an
/// empty report with [`ParseStrategy::None`].
pub struct SuggestionExtractor {
    config: ExtractorConfig,
    fallback: Box<dyn FallbackParser>,
}

impl SuggestionExtractor {
    /// Create an extractor; the fallback parser follows `config.fallback`
    pub fn new(config: ExtractorConfig) -> Self {
        let fallback: Box<dyn FallbackParser> = match config.fallback {
            FallbackMode::Lenient => Box::new(LenientLineParser::new(config.max_title_chars)),
            FallbackMode::Disabled => Box::new(NoFallback),
        };
        Self { config, fallback }
    }

    /// Replace the fallback parser
    pub fn with_fallback(mut self, fallback: impl FallbackParser + 'static) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract suggestions from one response produced for `source_path`
    pub fn extract(&self, raw_response: &str, source_path: &str) -> ExtractionReport {
        let (parsed, strategy) = match parse_strict(raw_response) {
            Ok(parsed) => (parsed, ParseStrategy::Strict),
            Err(e) => {
                debug!(
                    "Strict parse failed for {}: {}; trying {} fallback",
                    source_path,
                    e,
                    self.fallback.name()
                );
                let parsed = self.fallback.parse(raw_response);
                let strategy = if parsed.candidates.is_empty() {
                    ParseStrategy::None
                } else {
                    ParseStrategy::Lenient
                };
                (parsed, strategy)
            }
        };

        if strategy == ParseStrategy::None {
            warn!("No suggestions could be extracted for {}", source_path);
        }

        let report = self.normalize(parsed, strategy, source_path);
        info!(
            "Extracted {} suggestions from {} ({} strategy, {} rejected)",
            report.suggestions.len(),
            source_path,
            report.strategy.as_str(),
            report.rejected
        );
        report
    }

    fn normalize(
        &self,
        parsed: ParsedResponse,
        strategy: ParseStrategy,
        source_path: &str,
    ) -> ExtractionReport {
        let mut report = ExtractionReport {
            strategy,
            rejected: parsed.rejected,
            overall_assessment: parsed.overall_assessment,
            ..ExtractionReport::empty()
        };

        // Response order is kept; later duplicates fold into the first
        let mut order = Vec::new();
        let mut merged: BTreeMap<_, Suggestion> = BTreeMap::new();

        for candidate in parsed.candidates {
            let (category, coerced) = match candidate.category.as_deref() {
                Some(label) => Category::normalize(label),
                None => (FALLBACK_CATEGORY, true),
            };
            let (priority, defaulted) = Priority::normalize(candidate.priority.as_deref());
            if coerced {
                report.category_normalized += 1;
            }
            if defaulted {
                report.priority_defaulted += 1;
            }

            let suggestion = self.build(candidate, category, priority, source_path);
            match merged.get_mut(&suggestion.fingerprint) {
                Some(existing) => {
                    debug!("Merging duplicate suggestion '{}'", suggestion.title);
                    existing.merge(suggestion);
                }
                None => {
                    order.push(suggestion.fingerprint.clone());
                    merged.insert(suggestion.fingerprint.clone(), suggestion);
                }
            }
        }

        report.suggestions = order
            .iter()
            .filter_map(|fingerprint| merged.remove(fingerprint))
            .collect();
        report
    }

    fn build(
        &self,
        candidate: RawCandidate,
        category: Category,
        priority: Priority,
        source_path: &str,
    ) -> Suggestion {
        let title: String = candidate.title.chars().take(self.config.max_title_chars).collect();
        let description = if candidate.description.trim().is_empty() {
            title.clone()
        } else {
            candidate.description
        };

        let mut suggestion = Suggestion::new(category, priority, title, description, source_path);
        suggestion.justification = candidate.justification;
        suggestion.specific_changes = candidate.specific_changes;
        suggestion.location = candidate.location;
        suggestion.resources = candidate.resources;
        suggestion
    }
}

impl Default for SuggestionExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl std::fmt::Debug for SuggestionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionExtractor")
            .field("config", &self.config)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_response() {
        let extractor = SuggestionExtractor::default();
        let report = extractor.extract(
            r#"[{"type":"software_update","priority":"high","title":"Update NumPy to 2.0","description":"d","location":"Setup"}]"#,
            "a.md",
        );
        assert_eq!(report.strategy, ParseStrategy::Strict);
        assert_eq!(report.suggestions.len(), 1);
        let s = &report.suggestions[0];
        assert_eq!(s.category, Category::SoftwareUpdate);
        assert_eq!(s.priority, Priority::High);
        assert_eq!(s.location.as_deref(), Some("Setup"));
        assert_eq!(s.source_document_path, "a.md");
        assert_eq!(report.category_normalized, 0);
        assert_eq!(report.priority_defaulted, 0);
    }

    #[test]
    fn test_labels_normalized_and_counted() {
        let extractor = SuggestionExtractor::default();
        let report = extractor.extract(
            r#"[
                {"type":"Broken link","title":"Fix primer link"},
                {"title":"No category","priority":"whenever"},
                {"type":"banana","priority":"low","title":"Odd label"}
            ]"#,
            "a.md",
        );
        let categories: Vec<_> = report.suggestions.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![Category::ResourceUpdate, FALLBACK_CATEGORY, FALLBACK_CATEGORY]
        );
        assert_eq!(report.category_normalized, 3);
        assert_eq!(report.priority_defaulted, 2);
        assert_eq!(report.suggestions[1].priority, Priority::Medium);
    }

    #[test]
    fn test_duplicates_within_response_merged() {
        let extractor = SuggestionExtractor::default();
        let report = extractor.extract(
            r#"[
                {"type":"best_practice","priority":"low","title":"Use venv","description":"one"},
                {"type":"resource_update","title":"Other"},
                {"type":"best_practice","priority":"high","title":"use  VENV","description":"two"}
            ]"#,
            "a.md",
        );
        assert_eq!(report.suggestions.len(), 2);
        let first = &report.suggestions[0];
        assert_eq!(first.title, "Use venv");
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.occurrences, 2);
        assert_eq!(first.provenance, vec!["a.md"]);
        assert_eq!(report.suggestions[1].title, "Other");
    }

    #[test]
    fn test_long_title_cut() {
        let extractor = SuggestionExtractor::new(ExtractorConfig {
            max_title_chars: 10,
            ..ExtractorConfig::default()
        });
        let report = extractor.extract(r#"[{"type":"best_practice","title":"abcdefghijklmnop"}]"#, "a.md");
        assert_eq!(report.suggestions[0].title, "abcdefghij");
        assert_eq!(report.suggestions[0].description, "abcdefghij");
    }

    #[test]
    fn test_lenient_fallback() {
        let extractor = SuggestionExtractor::default();
        let report = extractor.extract("## Software Updates\n- Upgrade ROOT to 6.30", "a.md");
        assert_eq!(report.strategy, ParseStrategy::Lenient);
        assert_eq!(report.suggestions[0].category, Category::SoftwareUpdate);
        // "Software Updates" heading is an alias, not the canonical name
        assert_eq!(report.category_normalized, 1);
    }

    #[test]
    fn test_fallback_disabled() {
        let extractor = SuggestionExtractor::new(ExtractorConfig::strict());
        let report = extractor.extract("## Software Updates\n- Upgrade ROOT to 6.30", "a.md");
        assert_eq!(report.strategy, ParseStrategy::None);
        assert!(report.suggestions.is_empty());
    }
}
