//! GitHub REST client
//!
//! Reads repository trees and files, and searches and files issues.
//!
//! # Examples
//!
//! ```no_run
//! use refresher_domain::RepoRef;
//! use refresher_github::{GitHubClient, GitHubConfig};
//!
//! # async fn example() -> Result<(), refresher_github::GitHubError> {
//! let client = GitHubClient::new(GitHubConfig::default().with_token(Some("ghp_...".into())))?;
//! let repo = RepoRef::parse("https://github.com/hsf-training/hsf-training-docker").unwrap();
//! let files = client.list_tree(&repo).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::GitHubError;
use crate::title::sanitize_title;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use refresher_domain::{
    parse_retry_after, Classify, ContentSource, IssueDraft, IssueHandle, IssuePublisher, RepoRef,
    RetryPolicy, SourceEntry,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default per-request timeout (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ISSUES_PER_PAGE: usize = 100;
const MAX_ISSUE_PAGES: usize = 10;

/// GitHub connection settings
#[derive(Clone)]
pub struct GitHubConfig {
    /// API base URL (overridden in tests)
    pub api_base: String,

    /// Token sent as a Bearer credential; anonymous when `None`
    pub token: Option<String>,

    /// `User-Agent` header, required by the API
    pub user_agent: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Backoff for rate limits and transient failures
    pub retry: RetryPolicy,
}

impl GitHubConfig {
    /// Use a token (empty strings count as no token)
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Use a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            user_agent: concat!("refresher/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// GitHub REST API client
///
/// A repository referenced without a branch is read from its default branch,
/// looked up once per client and reused for every later listing and read.
#[derive(Debug)]
pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
    default_branches: Mutex<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct Tree {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
}

#[derive(Deserialize)]
struct FileContents {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Deserialize)]
struct IssueItem {
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
}

#[derive(Deserialize)]
struct CreatedIssue {
    number: u64,
    html_url: String,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

impl GitHubClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::Configuration` if the API base is not a URL or
    /// the HTTP client cannot be built.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        Url::parse(&config.api_base).map_err(|e| {
            GitHubError::Configuration(format!("Invalid API base '{}': {}", config.api_base, e))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GitHubError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        if config.token.is_none() {
            warn!("No GitHub token configured; using anonymous access (60 requests/hour)");
        }

        Ok(Self {
            config,
            http,
            default_branches: Mutex::new(HashMap::new()),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// Default branch of the repository
    pub async fn default_branch(&self, repo: &RepoRef) -> Result<String, GitHubError> {
        let url = self.url(["repos", repo.owner.as_str(), repo.name.as_str()])?;
        let info: RepoInfo = self.get_json(url).await?;
        debug!(repo = %repo.slug(), branch = %info.default_branch, "Resolved default branch");
        Ok(info.default_branch)
    }

    /// Every file under the reference's path, sorted by path
    pub async fn list_tree(&self, repo: &RepoRef) -> Result<Vec<SourceEntry>, GitHubError> {
        let branch = self.resolve_branch(repo).await?;
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str(), "git", "trees"];
        segments.extend(branch.split('/'));
        let mut url = self.url(segments)?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let tree: Tree = self.get_json(url).await?;
        if tree.truncated {
            warn!(repo = %repo.slug(), "Tree listing truncated by GitHub; some files are missing");
        }

        let mut entries: Vec<SourceEntry> = tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob" && repo.contains(&entry.path))
            .map(|entry| SourceEntry {
                path: entry.path,
                size: entry.size,
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        info!(repo = %repo.slug(), branch = %branch, files = entries.len(), "Listed repository files");
        Ok(entries)
    }

    /// Text content of one file
    pub async fn file_content(&self, repo: &RepoRef, path: &str) -> Result<String, GitHubError> {
        let branch = self.resolve_branch(repo).await?;
        let mut segments = vec!["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.url(segments)?;
        url.query_pairs_mut().append_pair("ref", &branch);

        let contents: FileContents = self.get_json(url.clone()).await?;
        let bytes = match contents.encoding.as_str() {
            "base64" => {
                let packed: String = contents.content.split_whitespace().collect();
                STANDARD.decode(packed).map_err(|e| GitHubError::Decode {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?
            }
            // Files over 1 MB come back without inline content
            "none" | "" => {
                debug!(path, "Fetching raw content");
                let response = self
                    .send(Idempotency::Idempotent, || {
                        self.request(Method::GET, url.clone())
                            .header(ACCEPT, "application/vnd.github.raw+json")
                    })
                    .await?;
                response.bytes().await?.to_vec()
            }
            other => {
                return Err(GitHubError::Decode {
                    path: path.to_string(),
                    reason: format!("unsupported encoding '{}'", other),
                })
            }
        };

        String::from_utf8(bytes).map_err(|e| GitHubError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Find an open issue (not a pull request) carrying `label` whose title
    /// equals the sanitized `title`
    pub async fn find_open_issue(
        &self,
        repo: &RepoRef,
        title: &str,
        label: &str,
    ) -> Result<Option<IssueHandle>, GitHubError> {
        let wanted = sanitize_title(title);

        for page in 1..=MAX_ISSUE_PAGES {
            let mut url = self.url(["repos", repo.owner.as_str(), repo.name.as_str(), "issues"])?;
            url.query_pairs_mut()
                .append_pair("state", "open")
                .append_pair("labels", label)
                .append_pair("per_page", &ISSUES_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let issues: Vec<IssueItem> = self.get_json(url).await?;
            let count = issues.len();
            if let Some(issue) = issues
                .into_iter()
                .find(|i| i.pull_request.is_none() && i.title == wanted)
            {
                return Ok(Some(IssueHandle {
                    number: issue.number,
                    url: issue.html_url,
                }));
            }
            if count < ISSUES_PER_PAGE {
                break;
            }
        }

        Ok(None)
    }

    /// File a new issue; the title is sanitized first
    pub async fn create_issue(&self, repo: &RepoRef, draft: &IssueDraft) -> Result<IssueHandle, GitHubError> {
        let url = self.url(["repos", repo.owner.as_str(), repo.name.as_str(), "issues"])?;
        let title = sanitize_title(&draft.title);
        let payload = NewIssue {
            title: &title,
            body: &draft.body,
            labels: &draft.labels,
        };

        let response = self
            .send(Idempotency::NotIdempotent, || {
                self.request(Method::POST, url.clone()).json(&payload)
            })
            .await?;
        let text = response.text().await?;
        let created: CreatedIssue = serde_json::from_str(&text)?;

        info!(repo = %repo.slug(), number = created.number, title = %title, "Created issue");
        Ok(IssueHandle {
            number: created.number,
            url: created.html_url,
        })
    }

    async fn resolve_branch(&self, repo: &RepoRef) -> Result<String, GitHubError> {
        if let Some(branch) = &repo.branch {
            return Ok(branch.clone());
        }

        // Held across the lookup so concurrent readers wait for one request
        let mut branches = self.default_branches.lock().await;
        let slug = repo.slug();
        if let Some(branch) = branches.get(&slug) {
            return Ok(branch.clone());
        }
        let branch = self.default_branch(repo).await?;
        branches.insert(slug, branch.clone());
        Ok(branch)
    }

    fn url<I>(&self, segments: I) -> Result<Url, GitHubError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = Url::parse(&self.config.api_base).map_err(|e| {
            GitHubError::Configuration(format!("Invalid API base '{}': {}", self.config.api_base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| GitHubError::Configuration(format!("Invalid API base '{}'", self.config.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitHubError> {
        let response = self
            .send(Idempotency::Idempotent, || self.request(Method::GET, url.clone()))
            .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request, retrying rate limits and transient failures
    ///
    /// A non-idempotent request is only retried after a rate limit, which
    /// GitHub answers before doing any work.
    async fn send<F>(&self, idempotency: Idempotency, build: F) -> Result<Response, GitHubError>
    where
        F: Fn() -> RequestBuilder,
    {
        let retry = self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match build().send().await {
                Ok(response) => check_status(response).await,
                Err(e) => Err(Failure::from(GitHubError::from(e))),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(Failure { error: e, retry_after })
                    if idempotency.may_retry(&e) && retry.should_retry(attempt) =>
                {
                    let delay = retry.delay_with_hint(attempt, retry_after);
                    warn!(
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "GitHub request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Idempotency {
    Idempotent,
    NotIdempotent,
}

impl Idempotency {
    fn may_retry(self, error: &GitHubError) -> bool {
        match self {
            Idempotency::Idempotent => error.is_retriable(),
            Idempotency::NotIdempotent => matches!(error, GitHubError::RateLimited(_)),
        }
    }
}

/// A failed exchange and the wait the server asked for, if any
struct Failure {
    error: GitHubError,
    retry_after: Option<Duration>,
}

impl From<GitHubError> for Failure {
    fn from(error: GitHubError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

async fn check_status(response: Response) -> Result<Response, Failure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let quota_exhausted = header("x-ratelimit-remaining").is_some_and(|v| v.trim() == "0");
    let retry_after = header("retry-after").as_deref().and_then(parse_retry_after);
    let body = response.text().await.unwrap_or_default();
    Err(Failure {
        error: classify_failure(status, quota_exhausted, &body),
        retry_after,
    })
}

fn classify_failure(status: StatusCode, quota_exhausted: bool, body: &str) -> GitHubError {
    let message = serde_json::from_str::<ApiMessage>(body)
        .ok()
        .map(|m| m.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect());

    match status {
        StatusCode::TOO_MANY_REQUESTS => GitHubError::RateLimited(message),
        StatusCode::FORBIDDEN
            if quota_exhausted || message.to_lowercase().contains("rate limit") =>
        {
            GitHubError::RateLimited(message)
        }
        StatusCode::UNAUTHORIZED => GitHubError::Authentication(message),
        StatusCode::FORBIDDEN => GitHubError::PermissionDenied(message),
        StatusCode::NOT_FOUND => GitHubError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GitHubError::Timeout,
        s if s.is_server_error() => GitHubError::Server {
            status: s.as_u16(),
            message,
        },
        s => GitHubError::Api {
            status: s.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl ContentSource for GitHubClient {
    type Error = GitHubError;

    async fn list_files(&self, repo: &RepoRef) -> Result<Vec<SourceEntry>, Self::Error> {
        self.list_tree(repo).await
    }

    async fn read_file(&self, repo: &RepoRef, path: &str) -> Result<String, Self::Error> {
        self.file_content(repo, path).await
    }
}

#[async_trait]
impl IssuePublisher for GitHubClient {
    type Error = GitHubError;

    async fn find_open_issue(
        &self,
        repo: &RepoRef,
        title: &str,
        label: &str,
    ) -> Result<Option<IssueHandle>, Self::Error> {
        GitHubClient::find_open_issue(self, repo, title, label).await
    }

    async fn publish(&self, repo: &RepoRef, draft: &IssueDraft) -> Result<IssueHandle, Self::Error> {
        self.create_issue(repo, draft).await
    }
}
