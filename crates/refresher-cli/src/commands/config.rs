//! Config command implementation.

use crate::config::Settings;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the config command: print the effective settings, secrets masked.
pub async fn execute_config(settings: &Settings, formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_settings(&settings.rows())?);
    if let Err(e) = settings.validate() {
        eprintln!("{}", formatter.warning(&e.to_string()));
    }
    Ok(())
}
