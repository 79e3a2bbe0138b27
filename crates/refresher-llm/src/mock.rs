//! Mock provider for deterministic testing

use crate::LlmError;
use async_trait::async_trait;
use refresher_domain::LlmProvider;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(LlmError),
}

#[derive(Debug, Default)]
struct Script {
    // (needle, reply); first rule whose needle occurs in the prompt wins
    rules: Vec<(String, Reply)>,
    // replayed before any rule, one per call
    queued_failures: VecDeque<LlmError>,
    prompts: Vec<String>,
}

/// Mock AI provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Rules match when their key occurs anywhere in the prompt, so tests can key
/// responses on a document path.
///
/// # Examples
///
/// ```
/// use refresher_llm::MockProvider;
/// use refresher_domain::LlmProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut provider = MockProvider::default();
/// provider.add_response("doc_a.md", "[]");
/// assert_eq!(provider.generate("File: doc_a.md ...").await.unwrap(), "[]");
/// assert_eq!(provider.generate("File: other.md").await.unwrap(), "Default mock response");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    model: String,
    delay: Duration,
    script: Arc<Mutex<Script>>,
    call_count: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            model: "mock".to_string(),
            delay: Duration::ZERO,
            script: Arc::new(Mutex::new(Script::default())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Respond with `response` to prompts containing `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        self.script()
            .rules
            .push((key.into(), Reply::Text(response.into())));
    }

    /// Fail prompts containing `key` with `error`
    pub fn add_error(&mut self, key: impl Into<String>, error: LlmError) {
        self.script().rules.push((key.into(), Reply::Fail(error)));
    }

    /// Fail the next `times` calls with `error`, whatever the prompt
    pub fn fail_next(&mut self, times: usize, error: LlmError) {
        let mut script = self.script();
        for _ in 0..times {
            script.queued_failures.push_back(error.clone());
        }
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.script().prompts.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not wedge the other callers
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply_for(&self, prompt: &str) -> Result<String, LlmError> {
        let mut script = self.script();
        script.prompts.push(prompt.to_string());

        if let Some(error) = script.queued_failures.pop_front() {
            return Err(error);
        }

        let reply = script
            .rules
            .iter()
            .find(|(key, _)| prompt == key || prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(error)) => Err(error),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply_for(prompt)
    }
}
