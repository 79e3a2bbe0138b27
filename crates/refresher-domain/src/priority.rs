//! Priority of a suggestion

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a suggestion
///
/// Ordered so that `Low < Medium < High`; merging keeps the maximum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Nice to have
    Low,

    /// Default when the reviewer does not say
    #[default]
    Medium,

    /// Should be addressed before the next delivery of the material
    High,
}

impl Priority {
    /// All priorities, highest first
    pub const DESCENDING: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Get the priority name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a priority label, accepting common synonyms
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" | "critical" | "urgent" | "major" | "p0" | "p1" => Some(Priority::High),
            "medium" | "moderate" | "normal" | "med" | "p2" => Some(Priority::Medium),
            "low" | "minor" | "trivial" | "optional" | "p3" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Normalize an optional label; returns the priority and whether it was defaulted
    pub fn normalize(raw: Option<&str>) -> (Self, bool) {
        match raw.and_then(Self::parse) {
            Some(priority) => (priority, false),
            None => (Priority::default(), true),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid priority: {}", s))
    }
}
