//! Configuration management for the CLI.
//!
//! Settings are layered: defaults, then the TOML file, then environment
//! variables (a `.env` file is loaded into the environment first), then
//! command-line flags.

use crate::error::{CliError, Result};
use refresher_analyzer::AnalyzerConfig;
use refresher_github::{GitHubConfig, DEFAULT_API_BASE};
use refresher_llm::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use refresher_llm::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log filter used when neither `--log-level` nor `RUST_LOG` is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Gemini access
    pub gemini: GeminiSettings,

    /// GitHub access
    pub github: GitHubSettings,

    /// Terminal output
    pub output: OutputSettings,

    /// Analysis run
    pub analysis: AnalyzerConfig,
}

/// Gemini settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API key (required)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Output token budget
    pub max_output_tokens: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// API base URL
    pub base_url: String,
}

/// GitHub settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// Token; needed to file issues and for higher rate limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// API base URL
    pub api_base: String,
}

/// Terminal output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Enable colored output
    pub color: bool,

    /// Default output format
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_output_tokens: 8192,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: None,
            gemini: GeminiSettings::default(),
            github: GitHubSettings::default(),
            output: OutputSettings::default(),
            analysis: AnalyzerConfig::default(),
        }
    }
}

// Secrets never reach logs through Debug
impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("token", &self.token.as_deref().map(mask_secret))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Settings {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".refresher").join("config.toml"))
    }

    /// Load settings from `path`, or from the default path when `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if !path.exists() {
            if explicit {
                return Err(CliError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay environment variables read through `lookup`.
    ///
    /// Recognized: `GEMINI_API_KEY`, `GEMINI_MODEL`, `GITHUB_TOKEN`,
    /// `LOG_LEVEL`, `MAX_FILE_SIZE_MB`, `ANALYSIS_TIMEOUT_SECONDS`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.log_level = Some(level);
        }
        if let Some(value) = get("MAX_FILE_SIZE_MB") {
            self.analysis.max_file_size_mb = parse_number("MAX_FILE_SIZE_MB", &value)?;
        }
        if let Some(value) = get("ANALYSIS_TIMEOUT_SECONDS") {
            self.analysis.analysis_timeout_secs = parse_number("ANALYSIS_TIMEOUT_SECONDS", &value)?;
        }
        Ok(())
    }

    /// Overlay the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Validate settings needed for an analysis run.
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(CliError::Config(
                "GEMINI_API_KEY is required (set it in the environment, a .env file, or [gemini] api_key)"
                    .to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return Err(CliError::Config(
                "gemini.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.gemini.request_timeout_secs == 0 {
            return Err(CliError::Config(
                "gemini.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.analysis
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Gemini client configuration.
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let api_key = self
            .gemini
            .api_key
            .clone()
            .ok_or_else(|| CliError::Config("GEMINI_API_KEY is required".to_string()))?;
        let mut config = GeminiConfig::new(api_key)
            .with_model(self.gemini.model.clone())
            .with_base_url(self.gemini.base_url.clone())
            .with_timeout(Duration::from_secs(self.gemini.request_timeout_secs));
        config.temperature = self.gemini.temperature;
        config.max_output_tokens = self.gemini.max_output_tokens;
        Ok(config)
    }

    /// GitHub client configuration.
    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig::default()
            .with_token(self.github.token.clone())
            .with_api_base(self.github.api_base.clone())
    }

    /// Effective settings as (name, value) rows, secrets masked.
    pub fn rows(&self) -> Vec<(String, String)> {
        let secret = |value: &Option<String>| {
            value
                .as_deref()
                .map(mask_secret)
                .unwrap_or_else(|| "(not set)".to_string())
        };
        let a = &self.analysis;
        vec![
            ("gemini.api_key".into(), secret(&self.gemini.api_key)),
            ("gemini.model".into(), self.gemini.model.clone()),
            ("gemini.temperature".into(), self.gemini.temperature.to_string()),
            ("gemini.max_output_tokens".into(), self.gemini.max_output_tokens.to_string()),
            ("gemini.request_timeout_secs".into(), self.gemini.request_timeout_secs.to_string()),
            ("github.token".into(), secret(&self.github.token)),
            ("github.api_base".into(), self.github.api_base.clone()),
            ("log_level".into(), self.log_level.clone().unwrap_or_else(|| "info".into())),
            ("analysis.supported_extensions".into(), a.supported_extensions.join(" ")),
            ("analysis.ignore_patterns".into(), a.ignore_patterns.join(" ")),
            ("analysis.max_file_size_mb".into(), a.max_file_size_mb.to_string()),
            ("analysis.min_content_chars".into(), a.min_content_chars.to_string()),
            ("analysis.concurrency".into(), a.concurrency.to_string()),
            ("analysis.analysis_timeout_secs".into(), a.analysis_timeout_secs.to_string()),
            (
                "analysis.focus_areas".into(),
                if a.focus_areas.is_empty() {
                    "all".to_string()
                } else {
                    a.focus_areas
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                },
            ),
            ("issues.create_issues".into(), a.issues.create_issues.to_string()),
            ("issues.create_summary".into(), a.issues.create_summary.to_string()),
            ("issues.skip_existing_issues".into(), a.issues.skip_existing_issues.to_string()),
            ("issues.dry_run".into(), a.issues.dry_run.to_string()),
            ("issues.label".into(), a.issues.label.clone()),
        ]
    }
}

/// Load a `.env` file into the process environment.
///
/// A missing default `.env` is fine; a missing explicit file is not. A
/// default `.env` that exists but cannot be parsed is skipped, and the
/// returned message says why.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<String>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                CliError::Config(format!("Failed to load environment file {}: {}", path.display(), e))
            })?;
            Ok(None)
        }
        None => Ok(default_env_warning(dotenvy::dotenv())),
    }
}

fn default_env_warning(loaded: std::result::Result<PathBuf, dotenvy::Error>) -> Option<String> {
    match loaded {
        Ok(_) => None,
        Err(e) if e.not_found() => None,
        Err(e) => Some(format!("Ignoring .env file: {}", e)),
    }
}

/// Show only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("{} must be a positive integer, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.gemini.model, "gemini-2.0-flash");
        assert_eq!(settings.gemini.max_output_tokens, 8192);
        assert_eq!(settings.gemini.request_timeout_secs, 300);
        assert_eq!(settings.analysis.max_file_size_mb, 10);
        assert_eq!(settings.analysis.analysis_timeout_secs, 300);
        assert!(settings.output.color);
    }

    #[test]
    fn test_env_overlay() {
        let mut settings = Settings::default();
        settings
            .apply_env(env(&[
                ("GEMINI_API_KEY", "AIzaSyExampleKey1234"),
                ("GITHUB_TOKEN", ""),
                ("MAX_FILE_SIZE_MB", "5"),
                ("ANALYSIS_TIMEOUT_SECONDS", "60"),
                ("GEMINI_MODEL", "gemini-1.5-pro"),
                ("LOG_LEVEL", "debug"),
            ]))
            .unwrap();

        assert_eq!(settings.gemini.api_key.as_deref(), Some("AIzaSyExampleKey1234"));
        assert!(settings.github.token.is_none());
        assert_eq!(settings.analysis.max_file_size_mb, 5);
        assert_eq!(settings.analysis.analysis_timeout_secs, 60);
        assert_eq!(settings.gemini.model, "gemini-1.5-pro");
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_number() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(env(&[("MAX_FILE_SIZE_MB", "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_FILE_SIZE_MB"));
    }

    #[test]
    fn test_missing_api_key() {
        let err = Settings::default().validate().unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            log_level = "warn"

            [gemini]
            api_key = "from-file-key-0000"

            [analysis]
            concurrency = 2

            [analysis.issues]
            label = "content-review"
            "#,
        )
        .unwrap();

        let mut settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.log_level.as_deref(), Some("warn"));
        assert_eq!(settings.analysis.concurrency, 2);
        assert_eq!(settings.analysis.issues.label, "content-review");
        assert_eq!(settings.gemini.model, "gemini-2.0-flash");

        // Environment wins over the file
        settings
            .apply_env(env(&[("GEMINI_API_KEY", "from-env-key-1111")]))
            .unwrap();
        assert_eq!(settings.gemini.api_key.as_deref(), Some("from-env-key-1111"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut settings = Settings::default();
        settings.analysis.concurrency = 6;
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(Some(&path)).unwrap(), settings);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_default_env_file_warnings() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no .env");
        assert_eq!(default_env_warning(Err(dotenvy::Error::Io(missing))), None);
        assert_eq!(default_env_warning(Ok(PathBuf::from(".env"))), None);

        let warning = default_env_warning(Err(dotenvy::Error::LineParse("not valid".into(), 0)));
        assert!(warning.unwrap().starts_with("Ignoring .env file"));
    }

    #[test]
    fn test_malformed_explicit_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.env");
        fs::write(&path, "this is not valid\n").unwrap();
        let err = load_env_file(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.env"));

        assert!(load_env_file(Some(&dir.path().join("absent.env"))).is_err());
    }

    #[test]
    fn test_rows_mask_secrets() {
        let mut settings = Settings::default();
        settings.gemini.api_key = Some("AIzaSyVerySecretKey9876".into());
        let rows = settings.rows();
        let key = &rows.iter().find(|(name, _)| name == "gemini.api_key").unwrap().1;
        assert_eq!(key, "****9876");
        let token = &rows.iter().find(|(name, _)| name == "github.token").unwrap().1;
        assert_eq!(token, "(not set)");
        assert!(!format!("{:?}", settings).contains("VerySecret"));
    }

    #[test]
    fn test_gemini_config() {
        let mut settings = Settings::default();
        settings.gemini.api_key = Some("key".into());
        settings.gemini.temperature = 0.1;
        let config = settings.gemini_config().unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
    }
}
