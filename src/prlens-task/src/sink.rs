//! Comment posting.

use async_trait::async_trait;
use prlens_batch::{BatchLabel, ReportSink};
use tracing::info;

use crate::repo::PullRequestContext;

/// Posts a general comment on a pull request.
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn post_comment(&self, pr: &PullRequestContext, body: &str) -> anyhow::Result<()>;
}

/// Routes batch reports to one pull request's comment thread.
pub struct PullRequestSink<'a> {
    comments: &'a dyn CommentSink,
    pr: &'a PullRequestContext,
}

impl<'a> PullRequestSink<'a> {
    pub fn new(comments: &'a dyn CommentSink, pr: &'a PullRequestContext) -> Self {
        Self { comments, pr }
    }
}

#[async_trait]
impl ReportSink for PullRequestSink<'_> {
    async fn post_report(&self, label: BatchLabel, body: &str) -> anyhow::Result<()> {
        info!("Posting {} review comment to {}", label, self.pr.slug());
        self.comments.post_comment(self.pr, body).await
    }
}
