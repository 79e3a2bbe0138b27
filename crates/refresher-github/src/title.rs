//! Issue title sanitization

/// Longest issue title sent to GitHub, in characters
pub const MAX_TITLE_CHARS: usize = 100;

/// Make a title safe to file as an issue.
///
/// Characters other than alphanumerics and ` -_.,()[]{}` become `_`; titles
/// longer than [`MAX_TITLE_CHARS`] are cut and end in `...`.
///
/// # Examples
///
/// ```
/// use refresher_github::sanitize_title;
///
/// assert_eq!(sanitize_title("[Refresher] Best Practices"), "[Refresher] Best Practices");
/// assert_eq!(sanitize_title("Use `uv` & pip"), "Use _uv_ _ pip");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let safe: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || " -_.,()[]{}".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();

    if safe.chars().count() > MAX_TITLE_CHARS {
        let cut: String = safe.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{}...", cut.trim_end())
    } else {
        safe.trim().to_string()
    }
}
