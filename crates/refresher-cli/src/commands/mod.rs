//! Command implementations.

pub mod analyze;
pub mod analyze_file;
pub mod config;

pub use self::analyze::execute_analyze;
pub use self::analyze_file::execute_analyze_file;
pub use self::config::execute_config;

use refresher_analyzer::AnalysisResult;
use std::process::ExitCode;

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Everything succeeded
    Success,

    /// The run completed but some documents or issues failed
    Partial,
}

impl RunStatus {
    /// Status of a finished analysis run.
    pub fn of(result: &AnalysisResult) -> Self {
        if result.has_failures() {
            RunStatus::Partial
        } else {
            RunStatus::Success
        }
    }

    /// Process exit code: `0` success, `2` partial failure.
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Partial => ExitCode::from(2),
        }
    }
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed.
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    tracing::warn!("Interrupt received, stopping analysis");
}
