//! Refresher CLI library.
//!
//! This library provides the core functionality for the Refresher command-line interface,
//! including settings management, command execution, and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::{Cli, Command};
pub use commands::RunStatus;
pub use config::Settings;
pub use error::{CliError, Result};
pub use output::Formatter;
