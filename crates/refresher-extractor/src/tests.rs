//! Cross-module tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        ExtractorConfig, FallbackParser, ParseStrategy, ParsedResponse, RawCandidate,
        SuggestionExtractor, SuggestionSet,
    };
    use proptest::prelude::*;
    use refresher_domain::{Category, Priority};

    const DOC_A: &str = r#"{"suggestions": [
        {"type": "software_update", "priority": "high", "title": "Update NumPy to 2.0",
         "description": "The lesson pins numpy 1.21"},
        {"type": "resource_update", "priority": "low", "title": "Fix ROOT primer link",
         "description": "The primer moved"}
    ], "overall_assessment": "Good"}"#;

    const DOC_B: &str = r#"[
        {"category": "Software update", "priority": "medium", "title": "update numpy to 2.0",
         "description": "numpy 2.0 changes the C API"}
    ]"#;

    #[test]
    fn test_merge_across_two_documents() {
        let extractor = SuggestionExtractor::default();
        let a = extractor.extract(DOC_A, "doc_a.md");
        let b = extractor.extract(DOC_B, "doc_b.md");
        assert_eq!(a.overall_assessment.as_deref(), Some("Good"));

        let mut set = SuggestionSet::new();
        set.extend(a.suggestions);
        set.extend(b.suggestions);

        assert_eq!(set.len(), 2);
        assert_eq!(set.merges(), 1);

        let numpy = set
            .iter()
            .find(|s| s.category == Category::SoftwareUpdate)
            .unwrap();
        assert_eq!(numpy.priority, Priority::High);
        assert_eq!(numpy.provenance, vec!["doc_a.md", "doc_b.md"]);
        assert_eq!(numpy.occurrences, 2);
        assert!(numpy.description.contains("numpy 1.21"));
        assert!(numpy.description.contains("C API"));
    }

    #[test]
    fn test_garbage_yields_empty_report() {
        let extractor = SuggestionExtractor::default();
        for garbage in ["This is not JSON", "", "{{{{", "- a\n- b", "null"] {
            let report = extractor.extract(garbage, "x.md");
            assert!(report.suggestions.is_empty(), "{:?}", garbage);
            assert_eq!(report.strategy, ParseStrategy::None);
        }
    }

    #[test]
    fn test_strict_preset_from_toml() {
        let config = ExtractorConfig::from_toml("fallback = \"disabled\"").unwrap();
        assert_eq!(config, ExtractorConfig::strict());
        let report = SuggestionExtractor::new(config).extract("- Upgrade the software", "x.md");
        assert!(report.suggestions.is_empty());
    }

    /// Reads `category | priority | title` lines
    struct PipeTableParser;

    impl FallbackParser for PipeTableParser {
        fn name(&self) -> &'static str {
            "pipe_table"
        }

        fn parse(&self, response: &str) -> ParsedResponse {
            let candidates = response
                .lines()
                .filter_map(|line| {
                    let cells: Vec<&str> = line.split('|').map(str::trim).collect();
                    match cells.as_slice() {
                        [category, priority, title] => Some(RawCandidate {
                            category: Some(category.to_string()),
                            priority: Some(priority.to_string()),
                            title: title.to_string(),
                            ..RawCandidate::default()
                        }),
                        _ => None,
                    }
                })
                .collect();
            ParsedResponse {
                candidates,
                ..ParsedResponse::default()
            }
        }
    }

    #[test]
    fn test_custom_fallback_output_is_normalized() {
        let extractor = SuggestionExtractor::new(ExtractorConfig::strict()).with_fallback(PipeTableParser);
        let response = "Software update | HIGH | Update NumPy to 2.0\n\
                        something odd | whenever | Explain the detector geometry\n\
                        Software update | low | update  numpy to 2.0";

        let report = extractor.extract(response, "doc_a.md");

        assert_eq!(report.strategy, ParseStrategy::Lenient);
        assert_eq!(report.suggestions.len(), 2);
        assert_eq!(report.category_normalized, 1);
        assert_eq!(report.priority_defaulted, 1);

        let numpy = report
            .suggestions
            .iter()
            .find(|s| s.category == Category::SoftwareUpdate)
            .unwrap();
        assert_eq!(numpy.priority, Priority::High);
        assert_eq!(numpy.provenance, vec!["doc_a.md"]);

        let other = report
            .suggestions
            .iter()
            .find(|s| s.category == Category::TechnicalAccuracy)
            .unwrap();
        assert_eq!(other.priority, Priority::Medium);
    }

    proptest! {
        #[test]
        fn prop_category_and_priority_always_in_closed_set(
            category in ".{0,30}",
            priority in ".{0,12}",
            title in "[a-zA-Z][a-zA-Z ]{0,40}",
        ) {
            let response = serde_json::json!([{
                "type": category,
                "priority": priority,
                "title": title,
            }])
            .to_string();
            let extractor = SuggestionExtractor::default();
            let first = extractor.extract(&response, "p.md");
            let second = extractor.extract(&response, "p.md");

            prop_assert_eq!(first.suggestions.len(), 1);
            prop_assert!(Category::ALL.contains(&first.suggestions[0].category));
            prop_assert!(Priority::DESCENDING.contains(&first.suggestions[0].priority));
            prop_assert_eq!(first, second);
        }
    }
}
