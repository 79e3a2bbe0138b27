//! Filing the drafted issues

use crate::config::IssueConfig;
use crate::issues::IssueComposer;
use crate::report::{AnalysisResult, IssueKind, IssueOutcome, IssueStatus};
use refresher_domain::{Classify, Disposition, IssueDraft, IssuePublisher, RepoRef};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Files category issues and the summary issue for a finished run
///
/// Issues are filed one at a time in category order, the summary last so
/// that it can link the category issues.
pub struct IssueFiler<P> {
    publisher: Arc<P>,
    config: IssueConfig,
    composer: IssueComposer,
}

impl<P: IssuePublisher> IssueFiler<P> {
    /// Create a filer
    pub fn new(publisher: Arc<P>, config: IssueConfig) -> Self {
        let composer = IssueComposer::new(config.label.clone());
        Self {
            publisher,
            config,
            composer,
        }
    }

    /// File the issues for `result`, recording every outcome on it.
    ///
    /// A failure to file one issue does not stop the others, except for a
    /// fatal error (bad credentials), after which the remaining issues are
    /// marked failed without contacting GitHub again.
    pub async fn file(&self, repo: &RepoRef, result: &mut AnalysisResult) {
        if result.suggestions.is_empty() {
            info!("No suggestions; no issues to file");
            return;
        }

        let mut fatal: Option<String> = None;

        if self.config.create_issues {
            for (category, draft) in self.composer.category_drafts(&result.suggestions) {
                let outcome = self
                    .file_one(repo, IssueKind::Category(category), draft, &mut fatal)
                    .await;
                result.push_issue(outcome);
            }
        }

        if self.config.create_summary {
            let draft = self.composer.summary_draft(result);
            let outcome = self
                .file_one(repo, IssueKind::Summary, draft, &mut fatal)
                .await;
            result.push_issue(outcome);
        }
    }

    async fn file_one(
        &self,
        repo: &RepoRef,
        kind: IssueKind,
        draft: IssueDraft,
        fatal: &mut Option<String>,
    ) -> IssueOutcome {
        let mut outcome = IssueOutcome {
            kind,
            title: draft.title.clone(),
            status: IssueStatus::Failed,
            number: None,
            url: None,
            error: None,
            body: None,
        };

        if self.config.dry_run {
            info!(issue = %kind.describe(), title = %draft.title, "Dry run; issue not filed");
            outcome.status = IssueStatus::DryRun;
            outcome.body = Some(draft.body);
            return outcome;
        }

        if let Some(message) = fatal.as_ref() {
            outcome.error = Some(format!("not attempted: {}", message));
            return outcome;
        }

        if self.config.skip_existing_issues {
            match self
                .publisher
                .find_open_issue(repo, &draft.title, &self.config.label)
                .await
            {
                Ok(Some(existing)) => {
                    info!(issue = %kind.describe(), number = existing.number, "Open issue already exists");
                    outcome.status = IssueStatus::Existing;
                    outcome.number = Some(existing.number);
                    outcome.url = Some(existing.url);
                    return outcome;
                }
                Ok(None) => {}
                Err(e) => {
                    // Filing anyway could duplicate an issue
                    warn!(issue = %kind.describe(), error = %e, "Existing-issue lookup failed");
                    if e.disposition() == Disposition::Abort {
                        *fatal = Some(e.to_string());
                    }
                    outcome.error = Some(e.to_string());
                    return outcome;
                }
            }
        }

        match self.publisher.publish(repo, &draft).await {
            Ok(handle) => {
                info!(issue = %kind.describe(), number = handle.number, url = %handle.url, "Issue created");
                outcome.status = IssueStatus::Created;
                outcome.number = Some(handle.number);
                outcome.url = Some(handle.url);
            }
            Err(e) => {
                error!(issue = %kind.describe(), error = %e, "Failed to create issue");
                if e.disposition() == Disposition::Abort {
                    *fatal = Some(e.to_string());
                }
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }
}
