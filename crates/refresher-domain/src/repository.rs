//! GitHub repository references

use std::fmt;

/// A validated reference to a GitHub repository, optionally narrowed to a
/// branch and a path inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Repository owner (user or organization)
    pub owner: String,

    /// Repository name without `.git`
    pub name: String,

    /// Branch or tag; `None` means the default branch
    pub branch: Option<String>,

    /// Sub-directory or file to restrict the analysis to
    pub path: Option<String>,
}

impl RepoRef {
    /// Create a reference to the default branch of `owner/name`
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: None,
            path: None,
        }
    }

    /// Parse a repository URL.
    ///
    /// Accepts `https://github.com/<owner>/<repo>[.git]`, optionally followed by
    /// `/tree/<branch>[/<path>]` or `/blob/<branch>/<path>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use refresher_domain::RepoRef;
    ///
    /// let repo = RepoRef::parse("https://github.com/hsf-training/hsf-training-docker.git").unwrap();
    /// assert_eq!(repo.slug(), "hsf-training/hsf-training-docker");
    ///
    /// let repo = RepoRef::parse("https://github.com/o/r/tree/gh-pages/_episodes").unwrap();
    /// assert_eq!(repo.branch.as_deref(), Some("gh-pages"));
    /// assert_eq!(repo.path.as_deref(), Some("_episodes"));
    ///
    /// assert!(RepoRef::parse("https://gitlab.com/o/r").is_err());
    /// ```
    pub fn parse(url: &str) -> Result<Self, String> {
        let url = url.trim();
        let rest = ["https://github.com/", "http://github.com/", "https://www.github.com/"]
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix))
            .ok_or_else(|| format!("Invalid GitHub URL: {}", url))?;

        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
        if parts.len() < 2 {
            return Err(format!("Invalid GitHub repository URL: {}", url));
        }

        let owner = parts[0];
        let name = parts[1].strip_suffix(".git").unwrap_or(parts[1]);
        if !is_valid_segment(owner) || !is_valid_segment(name) {
            return Err(format!("Invalid GitHub repository URL: {}", url));
        }

        let mut repo = Self::new(owner, name);
        match parts.get(2) {
            None => {}
            Some(&"tree") | Some(&"blob") => {
                let branch = parts
                    .get(3)
                    .ok_or_else(|| format!("Missing branch in URL: {}", url))?;
                repo.branch = Some(branch.to_string());
                if parts.len() > 4 {
                    repo.path = Some(parts[4..].join("/"));
                }
            }
            Some(other) => {
                return Err(format!("Unsupported GitHub URL section '{}': {}", other, url));
            }
        }

        Ok(repo)
    }

    /// Restrict the reference to a path inside the repository
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        let trimmed = path.trim_matches('/');
        self.path = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// `owner/name`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Browser URL of the repository
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}", self.slug())
    }

    /// Whether a repository path falls inside this reference's path filter
    pub fn contains(&self, path: &str) -> bool {
        match &self.path {
            None => true,
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.html_url())?;
        if let Some(branch) = &self.branch {
            write!(f, "/tree/{}", branch)?;
            if let Some(path) = &self.path {
                write!(f, "/{}", path)?;
            }
        } else if let Some(path) = &self.path {
            write!(f, " ({})", path)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let repo = RepoRef::parse("https://github.com/hsf-training/hsf-training-cmake-webpage").unwrap();
        assert_eq!(repo.owner, "hsf-training");
        assert_eq!(repo.name, "hsf-training-cmake-webpage");
        assert_eq!(repo.branch, None);
        assert_eq!(repo.path, None);
    }

    #[test]
    fn test_parse_trailing_slash_and_query() {
        let repo = RepoRef::parse("https://github.com/o/r/?tab=readme").unwrap();
        assert_eq!(repo.slug(), "o/r");
    }

    #[test]
    fn test_parse_blob_path() {
        let repo = RepoRef::parse("https://github.com/o/r/blob/main/nb/intro.ipynb").unwrap();
        assert_eq!(repo.branch.as_deref(), Some("main"));
        assert_eq!(repo.path.as_deref(), Some("nb/intro.ipynb"));
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        assert!(RepoRef::parse("").is_err());
        assert!(RepoRef::parse("https://github.com/only-owner").is_err());
        assert!(RepoRef::parse("https://github.com/o/r/issues/12").is_err());
        assert!(RepoRef::parse("https://github.com/o w/r").is_err());
        assert!(RepoRef::parse("ftp://github.com/o/r").is_err());
    }

    #[test]
    fn test_contains() {
        let repo = RepoRef::new("o", "r").with_path("/_episodes/");
        assert!(repo.contains("_episodes/01.md"));
        assert!(repo.contains("_episodes"));
        assert!(!repo.contains("_episodes_rmd/01.md"));
        assert!(RepoRef::new("o", "r").contains("anything.md"));
    }

    #[test]
    fn test_display() {
        let repo = RepoRef::parse("https://github.com/o/r/tree/dev/docs").unwrap();
        assert_eq!(repo.to_string(), "https://github.com/o/r/tree/dev/docs");
    }
}
