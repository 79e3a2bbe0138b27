//! Analyze-file command implementation.

use super::{shutdown_signal, RunStatus};
use crate::cli::AnalyzeFileArgs;
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use refresher_analyzer::{export, Analyzer};
use refresher_domain::RepoRef;
use refresher_github::GitHubClient;
use refresher_llm::GeminiProvider;
use std::sync::Arc;

/// Execute the analyze-file command. Never files issues.
pub async fn execute_analyze_file(
    args: AnalyzeFileArgs,
    settings: &Settings,
    formatter: &Formatter,
) -> Result<RunStatus> {
    settings.validate()?;

    let repo = RepoRef::parse(&args.repo_url).map_err(CliError::InvalidInput)?;
    if args.path.trim_matches('/').is_empty() {
        return Err(CliError::InvalidInput("file path must not be empty".to_string()));
    }

    let github = Arc::new(GitHubClient::new(settings.github_config())?);
    let gemini = Arc::new(GeminiProvider::new(settings.gemini_config()?)?);
    let analyzer = Analyzer::new(github, gemini, settings.analysis.clone())?;

    let result = analyzer
        .analyze_file_with_shutdown(&repo, &args.path, shutdown_signal())
        .await?;

    if let Some(path) = &args.output {
        export::write_json(&result, path)?;
        eprintln!("{}", formatter.success(&format!("Results exported to {}", path.display())));
    }

    println!("{}", formatter.format_result(&result)?);
    Ok(RunStatus::of(&result))
}
