//! Analyze command implementation.

use super::{shutdown_signal, RunStatus};
use crate::cli::AnalyzeArgs;
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use refresher_analyzer::{
    export, AnalysisResult, Analyzer, AnalyzerConfig, IssueConfig, IssueFiler, StopReason,
};
use refresher_domain::{IssuePublisher, RepoRef};
use refresher_github::GitHubClient;
use refresher_llm::GeminiProvider;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Execute the analyze command.
pub async fn execute_analyze(
    args: AnalyzeArgs,
    settings: &Settings,
    formatter: &Formatter,
) -> Result<RunStatus> {
    settings.validate()?;

    let mut repo = RepoRef::parse(&args.repo_url).map_err(CliError::InvalidInput)?;
    if let Some(path) = &args.path {
        repo = repo.with_path(path.as_str());
    }
    let config = run_config(&args, settings);

    let github = Arc::new(GitHubClient::new(settings.github_config())?);
    let gemini = Arc::new(GeminiProvider::new(settings.gemini_config()?)?);
    let analyzer = Analyzer::new(Arc::clone(&github), gemini, config.clone())?;

    let mut result = analyzer.analyze_with_shutdown(&repo, shutdown_signal()).await?;

    match filing(&result, &config.issues, settings.github.token.is_some()) {
        Filing::Disabled => {}
        Filing::Interrupted => {
            warn!("Run interrupted; skipping issue creation");
            eprintln!("{}", formatter.warning("Run interrupted; no issues were filed"));
        }
        Filing::MissingToken => {
            warn!("GITHUB_TOKEN not set; skipping issue creation");
            eprintln!(
                "{}",
                formatter.warning("GITHUB_TOKEN not set; no issues were filed (use --dry-run to preview them)")
            );
        }
        Filing::File => {
            let filer = IssueFiler::new(github, config.issues.clone());
            if file_until_shutdown(&filer, &repo, &mut result, shutdown_signal()).await {
                eprintln!(
                    "{}",
                    formatter.warning("Issue filing interrupted; remaining issues were not filed")
                );
            }
        }
    }

    if let Some(path) = &args.output {
        export::write_json(&result, path)?;
        eprintln!("{}", formatter.success(&format!("Results exported to {}", path.display())));
    }

    println!("{}", formatter.format_result(&result)?);
    Ok(RunStatus::of(&result))
}

/// Whether a finished run files issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filing {
    File,
    Disabled,
    Interrupted,
    MissingToken,
}

fn filing(result: &AnalysisResult, issues: &IssueConfig, has_token: bool) -> Filing {
    if !(issues.create_issues || issues.create_summary) {
        Filing::Disabled
    } else if result.stopped == Some(StopReason::Cancelled) {
        Filing::Interrupted
    } else if !has_token && !issues.dry_run {
        Filing::MissingToken
    } else {
        Filing::File
    }
}

/// File issues until `shutdown` completes. Returns `true` if interrupted;
/// issues filed before that stay recorded and the run is marked cancelled.
async fn file_until_shutdown<P, F>(
    filer: &IssueFiler<P>,
    repo: &RepoRef,
    result: &mut AnalysisResult,
    shutdown: F,
) -> bool
where
    P: IssuePublisher,
    F: Future<Output = ()>,
{
    let interrupted = tokio::select! {
        _ = filer.file(repo, result) => false,
        _ = shutdown => true,
    };
    if interrupted {
        warn!("Issue filing interrupted after {} issue(s)", result.issues.len());
        result.stopped = Some(StopReason::Cancelled);
    }
    interrupted
}

/// Apply command-line overrides to the configured run settings.
fn run_config(args: &AnalyzeArgs, settings: &Settings) -> AnalyzerConfig {
    let mut config = settings.analysis.clone();
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if args.no_issues {
        config.issues.create_issues = false;
    }
    if args.no_summary {
        config.issues.create_summary = false;
    }
    if args.dry_run {
        config.issues.dry_run = true;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use refresher_analyzer::RunMetrics;
    use refresher_domain::{Category, IssueDraft, IssueHandle, Priority, Suggestion};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn finished(stopped: Option<StopReason>) -> AnalysisResult {
        AnalysisResult {
            run_id: Default::default(),
            repository: "https://github.com/o/r".into(),
            branch: None,
            path: None,
            model: "mock".into(),
            started_at: serde_json::from_str("\"2026-03-01T12:00:00Z\"").unwrap(),
            finished_at: serde_json::from_str("\"2026-03-01T12:04:00Z\"").unwrap(),
            stopped,
            metrics: RunMetrics::default(),
            documents: Vec::new(),
            suggestions: vec![Suggestion::new(
                Category::SoftwareUpdate,
                Priority::High,
                "Update NumPy to 2.0",
                "",
                "a.md",
            )],
            issues: Vec::new(),
        }
    }

    /// Publisher that never finishes filing
    #[derive(Default)]
    struct StalledPublisher {
        calls: AtomicUsize,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("unreachable")]
    struct NeverFails;

    impl refresher_domain::Classify for NeverFails {
        fn disposition(&self) -> refresher_domain::Disposition {
            refresher_domain::Disposition::GiveUp
        }
    }

    #[async_trait]
    impl IssuePublisher for StalledPublisher {
        type Error = NeverFails;

        async fn find_open_issue(
            &self,
            _repo: &RepoRef,
            _title: &str,
            _label: &str,
        ) -> std::result::Result<Option<IssueHandle>, Self::Error> {
            Ok(None)
        }

        async fn publish(
            &self,
            _repo: &RepoRef,
            _draft: &IssueDraft,
        ) -> std::result::Result<IssueHandle, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(IssueHandle { number: 1, url: String::new() })
        }
    }

    #[test]
    fn test_interrupted_run_files_nothing() {
        let issues = IssueConfig::default();
        assert_eq!(
            filing(&finished(Some(StopReason::Cancelled)), &issues, true),
            Filing::Interrupted
        );
        assert_eq!(filing(&finished(Some(StopReason::Timeout)), &issues, true), Filing::File);
        assert_eq!(filing(&finished(None), &issues, true), Filing::File);
    }

    #[test]
    fn test_filing_needs_token_unless_dry_run() {
        let mut issues = IssueConfig::default();
        assert_eq!(filing(&finished(None), &issues, false), Filing::MissingToken);
        issues.dry_run = true;
        assert_eq!(filing(&finished(None), &issues, false), Filing::File);
        issues.create_issues = false;
        issues.create_summary = false;
        assert_eq!(filing(&finished(None), &issues, true), Filing::Disabled);
    }

    #[tokio::test]
    async fn test_interrupt_stops_filing() {
        let publisher = Arc::new(StalledPublisher::default());
        let filer = IssueFiler::new(Arc::clone(&publisher), IssueConfig::default());
        let mut result = finished(None);

        let interrupted = file_until_shutdown(
            &filer,
            &RepoRef::new("o", "r"),
            &mut result,
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;

        assert!(interrupted);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.stopped, Some(StopReason::Cancelled));
        assert!(result.issues.is_empty());
        assert_eq!(RunStatus::of(&result), RunStatus::Partial);
    }

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            repo_url: "https://github.com/o/r".into(),
            path: None,
            output: None,
            no_issues: false,
            no_summary: false,
            dry_run: false,
            concurrency: None,
        }
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings::default();
        let config = run_config(
            &AnalyzeArgs {
                no_issues: true,
                dry_run: true,
                concurrency: Some(1),
                ..args()
            },
            &settings,
        );
        assert!(!config.issues.create_issues);
        assert!(config.issues.create_summary);
        assert!(config.issues.dry_run);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_defaults_kept_without_flags() {
        let mut settings = Settings::default();
        settings.analysis.concurrency = 3;
        let config = run_config(&args(), &settings);
        assert_eq!(config, settings.analysis);
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let formatter = Formatter::new(crate::config::OutputFormat::Table, false);
        let err = execute_analyze(args(), &Settings::default(), &formatter)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let mut settings = Settings::default();
        settings.gemini.api_key = Some("key".into());
        let formatter = Formatter::new(crate::config::OutputFormat::Table, false);
        let err = execute_analyze(
            AnalyzeArgs {
                repo_url: "https://gitlab.com/o/r".into(),
                ..args()
            },
            &settings,
            &formatter,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }
}
