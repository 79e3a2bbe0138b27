//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Pick the log filter: `--log-level`, then `RUST_LOG`, then the `LOG_LEVEL`
/// setting, then `info`.
pub fn filter_directive(flag: Option<&str>, rust_log: Option<&str>, setting: Option<&str>) -> String {
    [flag, rust_log, setting]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|d| !d.is_empty())
        .unwrap_or("info")
        .to_lowercase()
}

/// Install the global subscriber, writing to stderr so stdout stays clean
/// for JSON output.
pub fn init(flag: Option<&str>, setting: Option<&str>, color: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(flag, rust_log.as_deref(), setting);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}' ({}); using info", directive, e);
        EnvFilter::new("info")
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(filter_directive(Some("debug"), Some("warn"), Some("error")), "debug");
        assert_eq!(filter_directive(None, Some("warn"), Some("error")), "warn");
        assert_eq!(filter_directive(None, None, Some("ERROR")), "error");
        assert_eq!(filter_directive(None, Some("  "), None), "info");
        assert_eq!(filter_directive(None, None, None), "info");
    }
}
