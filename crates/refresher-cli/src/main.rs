//! Refresher CLI - Review training material and file update suggestions as GitHub issues.

use anyhow::Context;
use clap::Parser;
use refresher_cli::config::OutputFormat;
use refresher_cli::{commands, config, logging, Cli, Command, Formatter, RunStatus, Settings};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunStatus> {
    // Logging is not initialized yet.
    if let Some(warning) = config::load_env_file(cli.env_file.as_deref())? {
        eprintln!("Warning: {}", warning);
    }

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    settings.apply_process_env()?;

    let color_enabled = !cli.no_color && settings.output.color;
    if !color_enabled {
        colored::control::set_override(false);
    }
    logging::init(cli.log_level.as_deref(), settings.log_level.as_deref(), color_enabled);

    let format: OutputFormat = cli.format.map(Into::into).unwrap_or(settings.output.format);
    let formatter = Formatter::new(format, color_enabled);

    let status = match cli.command {
        Command::Analyze(args) => commands::execute_analyze(args, &settings, &formatter).await?,
        Command::AnalyzeFile(args) => {
            commands::execute_analyze_file(args, &settings, &formatter).await?
        }
        Command::Config => {
            commands::execute_config(&settings, &formatter).await?;
            RunStatus::Success
        }
    };
    Ok(status)
}

