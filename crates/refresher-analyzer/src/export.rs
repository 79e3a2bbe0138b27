//! JSON export of run results

use crate::error::AnalyzerError;
use crate::report::AnalysisResult;
use std::path::Path;
use tracing::info;

/// Render a result as pretty-printed JSON
///
/// Field order follows the struct definitions and maps are ordered, so the
/// same result always renders the same text.
pub fn to_json(result: &AnalysisResult) -> Result<String, AnalyzerError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Write a result as JSON, creating parent directories as needed
pub fn write_json(result: &AnalysisResult, path: &Path) -> Result<(), AnalyzerError> {
    let json = to_json(result)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    info!("Results exported to {}", path.display());
    Ok(())
}

/// Read a result previously written with [`write_json`]
pub fn read_json(path: &Path) -> Result<AnalysisResult, AnalyzerError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
