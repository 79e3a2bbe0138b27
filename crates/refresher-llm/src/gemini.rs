//! Gemini Provider Implementation
//!
//! Calls Google's `generateContent` REST endpoint.
//!
//! # Features
//!
//! - Async HTTP communication with the Gemini API
//! - Configurable model, temperature and output budget
//! - Retry logic with exponential backoff for transient failures
//! - Error-envelope classification (authentication, quota, model, server)
//!
//! # Examples
//!
//! ```no_run
//! use refresher_llm::{GeminiConfig, GeminiProvider};
//!
//! let config = GeminiConfig::new("my-api-key");
//! let provider = GeminiProvider::new(config).unwrap();
//! ```

use crate::LlmError;
use async_trait::async_trait;
use refresher_domain::{parse_retry_after, Classify, LlmProvider, RetryPolicy};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Gemini API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default timeout for a single request (300 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Gemini connection and generation settings
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`
    pub api_key: String,

    /// Model name, e.g. `gemini-2.0-flash`
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Output token budget
    pub max_output_tokens: u32,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// API base URL (overridden in tests)
    pub base_url: String,

    /// Backoff for transient failures
    pub retry: RetryPolicy,
}

impl GeminiConfig {
    /// Default settings with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_output_tokens: 8192,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Use a different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Use a different per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Gemini API provider
#[derive(Debug)]
pub struct GeminiProvider {
    config: GeminiConfig,
    client: reqwest::Client,
}

/// Request body for `generateContent`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// Response from `generateContent`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// `{"error": {code, message, status}}`
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiProvider {
    /// Create a Gemini provider
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the API key is empty or the HTTP
    /// client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration(
                "Gemini API key is required. Set GEMINI_API_KEY environment variable.".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the provider configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// One request, no retries
    async fn generate_once(&self, prompt: &str) -> Result<String, Failure> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Failure {
                error: classify_failure(status, &text, &self.config.model),
                retry_after,
            });
        }

        // Some gateways answer 200 with an error envelope
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&text) {
            let status = StatusCode::from_u16(envelope.error.code).unwrap_or(StatusCode::BAD_GATEWAY);
            return Err(classify_failure(status, &text, &self.config.model).into());
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(extract_text(parsed)?)
    }
}

/// A failed request and the wait the server asked for, if any
struct Failure {
    error: LlmError,
    retry_after: Option<Duration>,
}

impl From<LlmError> for Failure {
    fn from(error: LlmError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

impl From<reqwest::Error> for Failure {
    fn from(e: reqwest::Error) -> Self {
        LlmError::from(e).into()
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    let mut finish_reason = None;
    let mut text = String::new();

    if let Some(candidate) = response.candidates.into_iter().next() {
        finish_reason = candidate.finish_reason;
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(part_text) = part.text {
                text.push_str(&part_text);
            }
        }
    }

    if text.trim().is_empty() {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked ({})", r))
            .or_else(|| finish_reason.map(|r| format!("finish reason {}", r)))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(LlmError::EmptyResponse(reason));
    }

    Ok(text)
}

/// Map a failed HTTP exchange to an error kind using the status code and the
/// API error envelope.
fn classify_failure(status: StatusCode, body: &str, model: &str) -> LlmError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let api_status = envelope.as_ref().map(|e| e.status.as_str()).unwrap_or_default();
    let message = envelope
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect());

    if api_status == "RESOURCE_EXHAUSTED" || status == StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimitExceeded(message);
    }
    if api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED"
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || message.contains("API key not valid")
    {
        return LlmError::Authentication(message);
    }
    if status == StatusCode::NOT_FOUND {
        return LlmError::ModelNotAvailable(model.to_string());
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return LlmError::Timeout;
    }
    if status.is_server_error() {
        return LlmError::Server {
            status: status.as_u16(),
            message,
        };
    }
    LlmError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let retry = self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.generate_once(prompt).await {
                Ok(text) => {
                    debug!(model = %self.config.model, attempt, chars = text.len(), "Gemini response received");
                    return Ok(text);
                }
                Err(Failure { error: e, retry_after })
                    if e.is_retriable() && retry.should_retry(attempt) =>
                {
                    let delay = retry.delay_with_hint(attempt, retry_after);
                    warn!(
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Gemini request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type Handler = fn(usize, &HeaderMap, &Value) -> (StatusCode, Value);

    #[derive(Clone)]
    struct Stub {
        calls: Arc<AtomicUsize>,
        handler: Handler,
    }

    async fn respond(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
        let call = stub.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let (status, value) = (stub.handler)(call, &headers, &body);
        (status, Json(value)).into_response()
    }

    async fn spawn(handler: Handler) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new().fallback(respond).with_state(Stub {
            calls: calls.clone(),
            handler,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), calls)
    }

    fn provider(base_url: &str, retry: RetryPolicy) -> GeminiProvider {
        let config = GeminiConfig::new("test-key")
            .with_base_url(base_url)
            .with_retry(retry);
        GeminiProvider::new(config).unwrap()
    }

    fn ok_body(text: &str) -> Value {
        json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}]})
    }

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_output_tokens, 8192);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!format!("{:?}", config).contains("key\""));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = GeminiProvider::new(GeminiConfig::new("  ")).unwrap_err();
        assert!(matches!(err, LlmError::Configuration(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_generate_success() {
        let (url, calls) = spawn(|_, headers, body| {
            assert_eq!(headers.get("x-goog-api-key").unwrap(), "test-key");
            assert_eq!(body["contents"][0]["parts"][0]["text"], "review me");
            assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
            (
                StatusCode::OK,
                json!({"candidates": [{"content": {"parts": [{"text": "[{\"title\":"}, {"text": " \"x\"}]"}]}}]}),
            )
        })
        .await;

        let text = provider(&url, RetryPolicy::none()).generate("review me").await.unwrap();
        assert_eq!(text, "[{\"title\": \"x\"}]");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_three_times_then_success() {
        let (url, calls) = spawn(|call, _, _| {
            if call <= 3 {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}),
                )
            } else {
                (StatusCode::OK, ok_body("[]"))
            }
        })
        .await;

        let text = provider(&url, RetryPolicy::immediate(5)).generate("p").await.unwrap();
        assert_eq!(text, "[]");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_after_header_honored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().fallback(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        [("retry-after", "1")],
                        Json(json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}})),
                    )
                        .into_response()
                } else {
                    (StatusCode::OK, Json(ok_body("[]"))).into_response()
                }
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let started = std::time::Instant::now();
        let text = provider(&format!("http://{}", addr), RetryPolicy::immediate(2))
            .generate("p")
            .await
            .unwrap();
        assert_eq!(text, "[]");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let (url, calls) = spawn(|_, _, _| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": {"code": 503, "message": "overloaded", "status": "UNAVAILABLE"}}),
            )
        })
        .await;

        let err = provider(&url, RetryPolicy::immediate(3)).generate("p").await.unwrap_err();
        assert_eq!(
            err,
            LlmError::Server {
                status: 503,
                message: "overloaded".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_authentication_not_retried() {
        let (url, calls) = spawn(|_, _, _| {
            (
                StatusCode::BAD_REQUEST,
                json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}),
            )
        })
        .await;

        let err = provider(&url, RetryPolicy::immediate(5)).generate("p").await.unwrap_err();
        assert!(matches!(err, LlmError::Authentication(_)));
        assert!(err.is_fatal());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forbidden_is_authentication() {
        let (url, _) = spawn(|_, _, _| (StatusCode::FORBIDDEN, json!({}))).await;
        let err = provider(&url, RetryPolicy::none()).generate("p").await.unwrap_err();
        assert!(matches!(err, LlmError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_model_not_found() {
        let (url, _) = spawn(|_, _, _| {
            (
                StatusCode::NOT_FOUND,
                json!({"error": {"code": 404, "message": "models/x is not found", "status": "NOT_FOUND"}}),
            )
        })
        .await;
        let err = provider(&url, RetryPolicy::none()).generate("p").await.unwrap_err();
        assert_eq!(err, LlmError::ModelNotAvailable("gemini-2.0-flash".to_string()));
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let (url, _) = spawn(|_, _, _| {
            (
                StatusCode::OK,
                json!({"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}),
            )
        })
        .await;
        let err = provider(&url, RetryPolicy::none()).generate("p").await.unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse("prompt blocked (SAFETY)".to_string()));
    }

    #[tokio::test]
    async fn test_timeout_is_retriable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().fallback(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(ok_body("late"))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = GeminiConfig::new("k")
            .with_base_url(format!("http://{}", addr))
            .with_retry(RetryPolicy::immediate(2))
            .with_timeout(Duration::from_millis(100));
        let err = GeminiProvider::new(config).unwrap().generate("p").await.unwrap_err();
        assert_eq!(err, LlmError::Timeout);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_classify_failure_plain_body() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "upstream down", "m");
        assert_eq!(
            err,
            LlmError::Server {
                status: 502,
                message: "upstream down".to_string()
            }
        );
        let err = classify_failure(StatusCode::CONFLICT, "", "m");
        assert!(matches!(err, LlmError::Api { status: 409, .. }));
    }
}
