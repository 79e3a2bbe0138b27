//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Refresher - Review training material with Gemini and file the suggestions as GitHub issues.
#[derive(Debug, Parser)]
#[command(name = "refresher")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.refresher/config.toml)
    #[arg(short, long, global = true, env = "REFRESHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Environment file loaded before reading settings (default: ./.env)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `refresher_github=trace` (overrides RUST_LOG and LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Review every supported file of a repository and file issues
    Analyze(AnalyzeArgs),

    /// Review a single file (never files issues)
    AnalyzeFile(AnalyzeFileArgs),

    /// Show the effective settings with secrets masked
    Config,
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Repository URL, e.g. https://github.com/hsf-training/hsf-training-docker
    pub repo_url: String,

    /// Restrict the review to a directory or file inside the repository
    #[arg(long)]
    pub path: Option<String>,

    /// Write the full results as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not file category issues
    #[arg(long)]
    pub no_issues: bool,

    /// Do not file the summary issue
    #[arg(long)]
    pub no_summary: bool,

    /// Render issues without filing them
    #[arg(long)]
    pub dry_run: bool,

    /// Documents reviewed at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Arguments for the analyze-file command.
#[derive(Debug, Parser)]
pub struct AnalyzeFileArgs {
    /// Repository URL
    pub repo_url: String,

    /// Path of the file inside the repository
    pub path: String,

    /// Write the full results as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
