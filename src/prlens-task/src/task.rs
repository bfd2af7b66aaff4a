//! Review task body and its outcome.

use std::sync::Arc;

use prlens_batch::{BatchCoordinator, ReviewPipeline};
use prlens_review::{AnalysisCapability, Analyzer, FileReview};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::Result;
use crate::config::ReviewConfig;
use crate::repo::{PullRequestContext, parse_repo_url};
use crate::sink::{CommentSink, PullRequestSink};
use crate::source::{FileSource, gather_files};

/// Lifecycle state reported for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What a caller submits: which pull request to review, and the host token.
#[derive(Debug)]
pub struct TaskRequest {
    pub repo_url: String,
    pub pr_number: u64,
    pub token: SecretString,
}

impl TaskRequest {
    pub fn new(repo_url: impl Into<String>, pr_number: u64, token: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            pr_number,
            token: SecretString::from(token.into()),
        }
    }
}

/// Reviews produced by a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResults {
    pub raw_output: Vec<FileReview>,
}

/// Final (or pending) state of a task, as returned to the status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<TaskResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskOutcome {
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            results: None,
            error: None,
        }
    }

    pub fn completed(task_id: impl Into<String>, raw_output: Vec<FileReview>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            results: Some(TaskResults { raw_output }),
            error: None,
        }
    }

    pub fn failed(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            results: None,
            error: Some(error.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Reviews of a completed task; empty otherwise.
    pub fn raw_output(&self) -> &[FileReview] {
        self.results
            .as_ref()
            .map(|r| r.raw_output.as_slice())
            .unwrap_or(&[])
    }
}

/// Runs one pull request review end to end.
///
/// Errors inside the per-file loop end up in the reviews; errors around it
/// (bad URL, listing files, posting a comment) fail the task. Comments for
/// batches that finished before a failure stay posted.
pub struct ReviewTask {
    config: ReviewConfig,
    source: Arc<dyn FileSource>,
    capability: Arc<dyn AnalysisCapability>,
    comments: Arc<dyn CommentSink>,
}

impl ReviewTask {
    pub fn new(
        config: ReviewConfig,
        source: Arc<dyn FileSource>,
        capability: Arc<dyn AnalysisCapability>,
        comments: Arc<dyn CommentSink>,
    ) -> Self {
        Self {
            config,
            source,
            capability,
            comments,
        }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Run under a freshly generated task id.
    pub async fn run(&self, request: TaskRequest) -> TaskOutcome {
        self.run_with_id(Uuid::new_v4().to_string(), request).await
    }

    pub async fn run_with_id(&self, task_id: impl Into<String>, request: TaskRequest) -> TaskOutcome {
        let task_id = task_id.into();
        let span = info_span!("review_task", task_id = %task_id, pr = request.pr_number);

        async {
            match self.execute(request).await {
                Ok(raw_output) => {
                    info!("Review task completed with {} result(s)", raw_output.len());
                    TaskOutcome::completed(task_id.as_str(), raw_output)
                }
                Err(e) => {
                    error!("Review task failed: {}", e);
                    TaskOutcome::failed(task_id.as_str(), e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, request: TaskRequest) -> Result<Vec<FileReview>> {
        self.config.validate()?;

        let (owner, repo) = parse_repo_url(&request.repo_url)?;
        let pr = PullRequestContext::new(owner, repo, request.pr_number, request.token);

        let files = gather_files(self.source.as_ref(), &pr, self.config.skip_removed_files).await?;

        let sink = PullRequestSink::new(self.comments.as_ref(), &pr);
        let report = self.coordinator().run_all(files, &sink).await?;

        for e in report.errors() {
            error!("Accumulation error during review of {}: {}", pr.slug(), e);
        }

        Ok(report.into_results())
    }

    fn coordinator(&self) -> BatchCoordinator {
        let analyzer =
            Analyzer::new(Arc::clone(&self.capability)).with_timeout(self.config.analysis_timeout());
        let pipeline = ReviewPipeline::new(analyzer).with_max_steps(self.config.max_steps);

        BatchCoordinator::new(pipeline)
            .with_batch_size(self.config.batch_size)
            .label_batches(self.config.label_batches)
    }
}
