//! Suggestion categories - the six focus areas of a content review

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a suggestion
///
/// The set is closed: anything the reviewer returns is coerced into one of
/// these values by [`Category::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Outdated software versions, libraries, frameworks or tools
    SoftwareUpdate,

    /// Practices or methodologies that have since improved
    BestPractice,

    /// Recent developments in the field relevant to the content
    RecentDevelopment,

    /// Broken links, moved documentation, stale references
    ResourceUpdate,

    /// Technical statements that may be outdated or wrong
    TechnicalAccuracy,

    /// More current or effective examples and exercises
    ExampleImprovement,
}

/// Catch-all for labels that match nothing else
pub const FALLBACK_CATEGORY: Category = Category::TechnicalAccuracy;

impl Category {
    /// All categories in presentation order
    pub const ALL: [Category; 6] = [
        Category::SoftwareUpdate,
        Category::BestPractice,
        Category::RecentDevelopment,
        Category::ResourceUpdate,
        Category::TechnicalAccuracy,
        Category::ExampleImprovement,
    ];

    /// Get the canonical snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SoftwareUpdate => "software_update",
            Category::BestPractice => "best_practice",
            Category::RecentDevelopment => "recent_development",
            Category::ResourceUpdate => "resource_update",
            Category::TechnicalAccuracy => "technical_accuracy",
            Category::ExampleImprovement => "example_improvement",
        }
    }

    /// Human readable heading used in issues and tables
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::SoftwareUpdate => "Software/Tool Updates",
            Category::BestPractice => "Best Practices",
            Category::RecentDevelopment => "Recent Developments",
            Category::ResourceUpdate => "Resource Updates",
            Category::TechnicalAccuracy => "Technical Accuracy",
            Category::ExampleImprovement => "Example Improvements",
        }
    }

    /// Focus-area instruction given to the reviewer for this category
    pub fn focus_description(&self) -> &'static str {
        match self {
            Category::SoftwareUpdate => {
                "Identify outdated software versions, libraries, frameworks, or tools that have newer stable releases"
            }
            Category::BestPractice => {
                "Highlight practices that have evolved or improved methodologies that should be adopted"
            }
            Category::RecentDevelopment => {
                "Note recent developments in high-energy physics, data analysis, or computational methods relevant to this content"
            }
            Category::ResourceUpdate => {
                "Identify broken links, outdated documentation references, or resources that have moved"
            }
            Category::TechnicalAccuracy => {
                "Check for technical information that may be outdated or incorrect"
            }
            Category::ExampleImprovement => {
                "Suggest more current or effective examples, case studies, or exercises"
            }
        }
    }

    /// Parse an exact canonical name (after case and separator folding)
    pub fn parse(s: &str) -> Option<Self> {
        match fold(s).as_str() {
            "software_update" => Some(Category::SoftwareUpdate),
            "best_practice" => Some(Category::BestPractice),
            "recent_development" => Some(Category::RecentDevelopment),
            "resource_update" => Some(Category::ResourceUpdate),
            "technical_accuracy" => Some(Category::TechnicalAccuracy),
            "example_improvement" => Some(Category::ExampleImprovement),
            _ => None,
        }
    }

    /// Map any label onto the closed set.
    ///
    /// Returns the category and whether the label had to be coerced (alias,
    /// keyword match, or fallback). Total: never fails, never returns a value
    /// outside [`Category::ALL`].
    ///
    /// # Examples
    ///
    /// ```
    /// use refresher_domain::Category;
    ///
    /// assert_eq!(Category::normalize("software_update"), (Category::SoftwareUpdate, false));
    /// assert_eq!(Category::normalize("Broken link"), (Category::ResourceUpdate, true));
    /// assert_eq!(Category::normalize("???"), (Category::TechnicalAccuracy, true));
    /// ```
    pub fn normalize(raw: &str) -> (Self, bool) {
        if let Some(category) = Self::parse(raw) {
            return (category, false);
        }
        (Self::from_keywords(raw).unwrap_or(FALLBACK_CATEGORY), true)
    }

    /// Look for a category keyword anywhere in free text
    pub fn from_keywords(text: &str) -> Option<Self> {
        let folded = fold(text);
        if folded.is_empty() {
            return None;
        }
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| folded.contains(w)))
            .map(|(category, _)| *category)
    }
}

// Order matters: earlier rows win when a label contains several keywords.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::SoftwareUpdate,
        &["software", "tool", "version", "librar", "dependenc", "package", "upgrade", "framework"],
    ),
    (Category::BestPractice, &["practice", "convention", "style", "methodolog"]),
    (
        Category::RecentDevelopment,
        &["development", "recent", "research", "trend", "new_feature"],
    ),
    (
        Category::ResourceUpdate,
        &["resource", "link", "url", "reference", "documentation", "docs"],
    ),
    (
        Category::ExampleImprovement,
        &["example", "exercise", "case_stud", "tutorial"],
    ),
    (
        Category::TechnicalAccuracy,
        &["accura", "technical", "correct", "error", "outdated"],
    ),
];

/// Lowercase, map separators to `_`, collapse runs, trim
fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}
