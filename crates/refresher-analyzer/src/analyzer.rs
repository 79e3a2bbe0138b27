//! Concurrent review of a repository's documents

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::report::{AnalysisResult, DocumentReport, DocumentStatus, RunMetrics, StopReason};
use crate::selection::FileSelector;
use chrono::Utc;
use refresher_domain::{
    Category, Classify, ContentSource, LlmProvider, RepoRef, SourceEntry,
};
use refresher_extractor::{ExtractionReport, PromptBuilder, SuggestionExtractor, SuggestionSet};
use refresher_processor::FormatProcessor;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Reviews documents from a content source with an AI provider
///
/// Documents are reviewed concurrently (bounded by `concurrency`) under one
/// overall time budget. A document that cannot be reviewed is recorded on
/// the result and does not stop the run; only rejected credentials do.
///
/// # Examples
///
/// ```no_run
/// use refresher_analyzer::{Analyzer, AnalyzerConfig};
/// use refresher_domain::RepoRef;
/// use refresher_github::{GitHubClient, GitHubConfig};
/// use refresher_llm::{GeminiConfig, GeminiProvider};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let github = Arc::new(GitHubClient::new(GitHubConfig::default())?);
///     let gemini = Arc::new(GeminiProvider::new(GeminiConfig::new("api-key"))?);
///     let analyzer = Analyzer::new(github, gemini, AnalyzerConfig::review_only())?;
///
///     let repo = RepoRef::parse("https://github.com/hsf-training/hsf-training-docker")?;
///     let result = analyzer.analyze(&repo).await?;
///     println!("{}", result.metrics.summary());
///     Ok(())
/// }
/// ```
pub struct Analyzer<S, L> {
    pipeline: Arc<Pipeline<S, L>>,
    selector: FileSelector,
    config: AnalyzerConfig,
}

impl<S, L> Analyzer<S, L>
where
    S: ContentSource + 'static,
    L: LlmProvider + 'static,
{
    /// Create an analyzer
    ///
    /// # Errors
    ///
    /// Returns `AnalyzerError::Configuration` when the configuration is invalid.
    pub fn new(source: Arc<S>, provider: Arc<L>, config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        let selector = FileSelector::new(&config)?;
        let pipeline = Pipeline {
            source,
            provider,
            processor: FormatProcessor::new(config.processor_config()),
            prompts: PromptBuilder::new(&config.extractor),
            extractor: SuggestionExtractor::new(config.extractor.clone()),
            focus_areas: config.focus_areas.clone(),
        };
        Ok(Self {
            pipeline: Arc::new(pipeline),
            selector,
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Review every supported file of a repository
    pub async fn analyze(&self, repo: &RepoRef) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_with_shutdown(repo, std::future::pending::<()>()).await
    }

    /// Review every supported file, stopping early when `shutdown` completes.
    ///
    /// Documents still in flight when the run stops (shutdown or time budget)
    /// are recorded as failed with reason `cancelled` or `timeout`; whatever
    /// finished before is kept.
    ///
    /// # Errors
    ///
    /// - `AnalyzerError::Configuration` when a collaborator rejects the credentials
    /// - `AnalyzerError::Source` when the repository cannot be listed
    pub async fn analyze_with_shutdown<F>(
        &self,
        repo: &RepoRef,
        shutdown: F,
    ) -> Result<AnalysisResult, AnalyzerError>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        info!(repository = %repo, model = %self.pipeline.provider.model_name(), "Starting analysis");

        let entries = self.pipeline.source.list_files(repo).await.map_err(|e| {
            if e.is_fatal() {
                AnalyzerError::Configuration(e.to_string())
            } else {
                AnalyzerError::Source(e.to_string())
            }
        })?;
        debug!("Repository lists {} files", entries.len());

        let selection = self.selector.select(entries);
        info!(
            "Found {} documents to review ({} over the size limit)",
            selection.documents.len(),
            selection.oversize.len()
        );

        let mut reports: Vec<DocumentReport> = selection
            .oversize
            .iter()
            .map(|entry| {
                let detail = self
                    .pipeline
                    .processor
                    .check_size(&entry.path, entry.size)
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                DocumentReport::skipped(&entry.path, "size_limit", detail)
            })
            .collect();

        let run = self.review_all(repo, selection.documents, shutdown).await?;
        reports.extend(run.reports);

        Ok(self.finish(repo, started_at, run.stopped, reports, run.extractions))
    }

    /// Review a single file
    ///
    /// # Errors
    ///
    /// Returns `AnalyzerError::Configuration` when a collaborator rejects the
    /// credentials.
    pub async fn analyze_file(&self, repo: &RepoRef, path: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_file_with_shutdown(repo, path, std::future::pending::<()>())
            .await
    }

    /// Review a single file, stopping early when `shutdown` completes
    pub async fn analyze_file_with_shutdown<F>(
        &self,
        repo: &RepoRef,
        path: &str,
        shutdown: F,
    ) -> Result<AnalysisResult, AnalyzerError>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let path = path.trim_matches('/');
        info!(repository = %repo, path = %path, "Analyzing single file");

        let entry = SourceEntry {
            path: path.to_string(),
            size: 0,
        };
        let run = self.review_all(repo, vec![entry], shutdown).await?;

        let repo = repo.clone().with_path(path);
        Ok(self.finish(&repo, started_at, run.stopped, run.reports, run.extractions))
    }

    async fn review_all<F>(
        &self,
        repo: &RepoRef,
        documents: Vec<SourceEntry>,
        shutdown: F,
    ) -> Result<ReviewRun, AnalyzerError>
    where
        F: Future<Output = ()>,
    {
        let total = documents.len();
        let paths: Vec<String> = documents.iter().map(|e| e.path.clone()).collect();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for entry in documents {
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&semaphore);
            let repo = repo.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return Outcome::failed(&entry.path, "cancelled", "run stopped"),
                };
                pipeline.review(&repo, &entry.path).await
            });
        }

        let deadline = tokio::time::sleep(self.config.analysis_timeout());
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut outcomes: Vec<Outcome> = Vec::with_capacity(total);
        let mut stopped = None;
        let mut fatal: Option<String> = None;

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(outcome)) => {
                        info!(
                            "[{}/{}] {} {}",
                            outcomes.len() + 1,
                            total,
                            outcome.report.path,
                            outcome.report.status.as_str()
                        );
                        if let Some(message) = &outcome.fatal {
                            error!("Aborting analysis: {}", message);
                            fatal = Some(message.clone());
                            outcomes.push(outcome);
                            break;
                        }
                        outcomes.push(outcome);
                    }
                    Some(Err(e)) => error!("Review task ended abnormally: {}", e),
                },
                _ = &mut deadline => {
                    warn!(
                        "Analysis timed out after {}s; {} of {} documents finished",
                        self.config.analysis_timeout_secs,
                        outcomes.len(),
                        total
                    );
                    stopped = Some(StopReason::Timeout);
                    break;
                }
                _ = &mut shutdown => {
                    warn!("Shutdown requested; {} of {} documents finished", outcomes.len(), total);
                    stopped = Some(StopReason::Cancelled);
                    break;
                }
            }
        }

        if !tasks.is_empty() {
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                if let Ok(outcome) = joined {
                    outcomes.push(outcome);
                }
            }
        }

        if let Some(message) = fatal {
            return Err(AnalyzerError::Configuration(message));
        }

        let unfinished_reason = stopped.map(|s| s.as_str()).unwrap_or("internal_error");
        let mut by_path: BTreeMap<String, Outcome> = outcomes
            .into_iter()
            .map(|o| (o.report.path.clone(), o))
            .collect();

        let mut run = ReviewRun {
            stopped,
            reports: Vec::with_capacity(total),
            extractions: Vec::new(),
        };
        for path in paths {
            match by_path.remove(&path) {
                Some(outcome) => {
                    run.reports.push(outcome.report);
                    if let Some(extraction) = outcome.extraction {
                        run.extractions.push(extraction);
                    }
                }
                None => run.reports.push(DocumentReport::failed(
                    &path,
                    unfinished_reason,
                    "review did not finish",
                )),
            }
        }
        Ok(run)
    }

    fn finish(
        &self,
        repo: &RepoRef,
        started_at: chrono::DateTime<Utc>,
        stopped: Option<StopReason>,
        mut documents: Vec<DocumentReport>,
        extractions: Vec<ExtractionReport>,
    ) -> AnalysisResult {
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        let mut metrics = RunMetrics::default();
        for report in &documents {
            metrics.record_document(report);
        }

        // Extractions arrive in path order, so merged provenance is deterministic
        let mut set = SuggestionSet::new();
        for extraction in extractions {
            metrics.category_normalized += extraction.category_normalized;
            metrics.priority_defaulted += extraction.priority_defaulted;
            metrics.rejected_entries += extraction.rejected;
            set.extend(extraction.suggestions);
        }
        metrics.merged_duplicates = set.merges();
        let suggestions = set.into_vec();
        metrics.record_suggestions(&suggestions);

        info!(
            "Analysis finished: {} suggestions from {} documents ({} skipped, {} failed)",
            metrics.total_suggestions, metrics.succeeded, metrics.skipped, metrics.failed
        );

        AnalysisResult {
            run_id: Uuid::now_v7(),
            repository: repo.html_url(),
            branch: repo.branch.clone(),
            path: repo.path.clone(),
            model: self.pipeline.provider.model_name().to_string(),
            started_at,
            finished_at: Utc::now(),
            stopped,
            metrics,
            documents,
            suggestions,
            issues: Vec::new(),
        }
    }
}

struct ReviewRun {
    stopped: Option<StopReason>,
    reports: Vec<DocumentReport>,
    extractions: Vec<ExtractionReport>,
}

/// Result of one document's review task
struct Outcome {
    report: DocumentReport,
    extraction: Option<ExtractionReport>,
    fatal: Option<String>,
}

impl Outcome {
    fn failed(path: &str, reason: &str, detail: impl Into<String>) -> Self {
        Self {
            report: DocumentReport::failed(path, reason, detail),
            extraction: None,
            fatal: None,
        }
    }

    fn skipped(path: &str, reason: &str, detail: impl Into<String>) -> Self {
        Self {
            report: DocumentReport::skipped(path, reason, detail),
            extraction: None,
            fatal: None,
        }
    }

    fn fatal<E: Classify + std::fmt::Display>(mut self, e: &E) -> Self {
        if e.is_fatal() {
            self.fatal = Some(e.to_string());
        }
        self
    }
}

/// Everything a review task needs, shared across tasks
struct Pipeline<S, L> {
    source: Arc<S>,
    provider: Arc<L>,
    processor: FormatProcessor,
    prompts: PromptBuilder,
    extractor: SuggestionExtractor,
    focus_areas: Vec<Category>,
}

impl<S: ContentSource, L: LlmProvider> Pipeline<S, L> {
    /// Read, process, prompt, generate, extract
    async fn review(&self, repo: &RepoRef, path: &str) -> Outcome {
        let raw = match self.source.read_file(repo, path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read file");
                return Outcome::failed(path, "source_error", e.to_string()).fatal(&e);
            }
        };

        let document = match self.processor.process(path, &raw) {
            Ok(document) => document,
            Err(e) => {
                info!(path = %path, reason = e.reason(), "Skipping document: {}", e);
                return Outcome::skipped(path, e.reason(), e.to_string());
            }
        };

        let request = self.prompts.build(&document, &self.focus_areas);
        if request.truncated {
            debug!(path = %path, "Document body truncated in prompt");
        }

        let response = match self.provider.generate(&request.prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(path = %path, error = %e, "Review request failed");
                return Outcome::failed(path, "provider_error", e.to_string()).fatal(&e);
            }
        };

        let extraction = self.extractor.extract(&response, path);
        let report = DocumentReport {
            path: path.to_string(),
            format: Some(document.format),
            status: DocumentStatus::Succeeded,
            reason: None,
            detail: None,
            suggestions: extraction.suggestions.len(),
            strategy: Some(extraction.strategy),
            truncated: request.truncated,
            overall_assessment: extraction.overall_assessment.clone(),
        };

        Outcome {
            report,
            extraction: Some(extraction),
            fatal: None,
        }
    }
}
