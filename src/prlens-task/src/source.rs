//! Changed-file source and file gathering.

use async_trait::async_trait;
use prlens_review::FileTask;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::repo::PullRequestContext;
use crate::{Result, TaskError};

/// A file touched by the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    /// Host-reported change status ("added", "modified", "removed", ...).
    #[serde(default)]
    pub status: Option<String>,
}

impl ChangedFile {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn is_removed(&self) -> bool {
        self.status.as_deref() == Some("removed")
    }
}

/// Repository host access for a pull request.
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn list_changed_files(&self, pr: &PullRequestContext) -> anyhow::Result<Vec<ChangedFile>>;

    /// Commit the pull request head currently points at.
    async fn head_commit(&self, pr: &PullRequestContext) -> anyhow::Result<String>;

    async fn file_content(
        &self,
        pr: &PullRequestContext,
        filename: &str,
        commit: &str,
    ) -> anyhow::Result<String>;
}

/// Build the review list for a pull request.
///
/// Failing to list files or resolve the head commit fails the whole task. A
/// file whose content cannot be fetched is logged and left out.
pub async fn gather_files(
    source: &dyn FileSource,
    pr: &PullRequestContext,
    skip_removed: bool,
) -> Result<Vec<FileTask>> {
    info!("Fetching PR files: {}", pr.slug());
    let changed = source
        .list_changed_files(pr)
        .await
        .map_err(|e| TaskError::Source(format!("Failed to list changed files: {e:#}")))?;

    let head = source
        .head_commit(pr)
        .await
        .map_err(|e| TaskError::Source(format!("Failed to resolve head commit: {e:#}")))?;
    debug!("Head commit for {}: {}", pr.slug(), head);

    let mut files = Vec::with_capacity(changed.len());
    for file in changed {
        if skip_removed && file.is_removed() {
            debug!("Skipping removed file {}", file.filename);
            continue;
        }

        match source.file_content(pr, &file.filename, &head).await {
            Ok(content) => files.push(
                FileTask::new(file.filename, content).with_pull_request(
                    &pr.owner,
                    &pr.repo,
                    pr.number,
                ),
            ),
            Err(e) => warn!("Skipping {}: failed to fetch content: {:#}", file.filename, e),
        }
    }

    info!("Gathered {} file(s) for review from {}", files.len(), pr.slug());
    Ok(files)
}
