//! Document to suggestions through a scripted reviewer

use refresher_domain::{Category, DocumentFormat, LlmProvider, Priority};
use refresher_extractor::{ExtractorConfig, ParseStrategy, PromptBuilder, SuggestionExtractor, SuggestionSet};
use refresher_llm::MockProvider;

const LESSON: &str = "---
title: Working with NumPy
---

# Arrays

NumPy arrays are the workhorse of scientific Python. This episode shows how
to create them and how to compute with them efficiently.

```python
import numpy as np
a = np.arange(10)
```

See the [NumPy docs](https://numpy.org/doc/1.21/) for details.
";

#[tokio::test]
async fn test_prompt_to_suggestions() {
    let document = refresher_processor::process("_episodes/03-numpy.md", LESSON, DocumentFormat::Markdown).unwrap();

    let mut provider = MockProvider::default();
    provider.add_response(
        "FILE: _episodes/03-numpy.md",
        r#"```json
{"suggestions": [
  {"type": "software_update", "priority": "high", "title": "Link the current NumPy docs",
   "description": "The docs link points at 1.21", "resources": ["https://numpy.org/doc/stable/"]},
  {"type": "best_practice", "priority": "medium", "title": "Seed random generators"}
]}
```"#,
    );

    let builder = PromptBuilder::new(&ExtractorConfig::default());
    let request = builder.build(&document, &[]);
    assert_eq!(request.title, "Working with NumPy");
    assert!(request.prompt.contains("Libraries detected: numpy"));
    assert!(request.prompt.contains("https://numpy.org/doc/1.21/"));

    let response = provider.generate(&request.prompt).await.unwrap();
    assert_eq!(provider.call_count(), 1);

    let report = SuggestionExtractor::default().extract(&response, &request.document_path);
    assert_eq!(report.strategy, ParseStrategy::Strict);
    assert_eq!(report.suggestions.len(), 2);

    let set: SuggestionSet = report.suggestions.into_iter().collect();
    let groups = set.by_category();
    let docs = &groups[&Category::SoftwareUpdate][0];
    assert_eq!(docs.priority, Priority::High);
    assert_eq!(docs.resources.as_deref(), Some("https://numpy.org/doc/stable/"));
    assert_eq!(docs.source_document_path, "_episodes/03-numpy.md");
    assert!(groups.contains_key(&Category::BestPractice));
}

#[tokio::test]
async fn test_unstructured_reply_falls_back() {
    let document = refresher_processor::process("_episodes/03-numpy.md", LESSON, DocumentFormat::Markdown).unwrap();
    let provider = MockProvider::new(
        "I reviewed the lesson.\n\n**Resource updates**\n- Fix the NumPy docs link: it points at an old release\n",
    );

    let request = PromptBuilder::new(&ExtractorConfig::default()).build(&document, &[Category::ResourceUpdate]);
    let response = provider.generate(&request.prompt).await.unwrap();
    let report = SuggestionExtractor::default().extract(&response, &request.document_path);

    assert_eq!(report.strategy, ParseStrategy::Lenient);
    assert_eq!(report.suggestions.len(), 1);
    assert_eq!(report.suggestions[0].category, Category::ResourceUpdate);
    assert_eq!(report.suggestions[0].title, "Fix the NumPy docs link");
}
