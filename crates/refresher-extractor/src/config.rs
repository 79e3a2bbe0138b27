//! Configuration for prompt building and suggestion extraction

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};

/// What to do when the response is not valid structured output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Scan lines for bullets and category keywords
    #[default]
    Lenient,

    /// Give up: zero suggestions
    Disabled,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Character budget for the document body inside the prompt
    pub max_body_chars: usize,

    /// Fraction of the budget after which truncation may cut at a sentence end
    pub sentence_boundary_ratio: f64,

    /// Longest accepted suggestion title (characters); longer titles are cut
    pub max_title_chars: usize,

    /// Fallback behaviour for unstructured responses
    pub fallback: FallbackMode,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.max_body_chars == 0 {
            return Err(ExtractorError::Config(
                "max_body_chars must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sentence_boundary_ratio) {
            return Err(ExtractorError::Config(
                "sentence_boundary_ratio must be between 0 and 1".to_string(),
            ));
        }
        if self.max_title_chars < 10 {
            return Err(ExtractorError::Config(
                "max_title_chars must be at least 10".to_string(),
            ));
        }
        Ok(())
    }

    /// Strict preset: structured output only, no line heuristics
    pub fn strict() -> Self {
        Self {
            fallback: FallbackMode::Disabled,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_body_chars: 60_000,
            sentence_boundary_ratio: 0.8,
            max_title_chars: 200,
            fallback: FallbackMode::Lenient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::strict().validate().is_ok());
    }

    #[test]
    fn test_invalid_budget() {
        let config = ExtractorConfig {
            max_body_chars: 0,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_ratio() {
        let config = ExtractorConfig {
            sentence_boundary_ratio: 1.5,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("max_body_chars = 1000\nfallback = \"disabled\"").unwrap();
        assert_eq!(config.max_body_chars, 1000);
        assert_eq!(config.fallback, FallbackMode::Disabled);
        assert_eq!(config.max_title_chars, 200);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let parsed = ExtractorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
