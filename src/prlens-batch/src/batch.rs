//! Batch coordination.
//!
//! Large pull requests are split into fixed-size groups. Each group runs
//! through its own [`ReviewPipeline`], and its rendered report is posted as
//! soon as the group finishes, so reviewers see progress instead of waiting
//! on one long run. Groups run strictly one after another.

use async_trait::async_trait;
use prlens_review::{FileReview, FileTask, render_markdown};
use serde::Serialize;
use tracing::{Instrument, error, info, info_span, warn};

use crate::pipeline::ReviewPipeline;
use crate::{BatchError, Result};

/// Default number of files per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Position of a batch within a run (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchLabel {
    pub ordinal: usize,
    pub total: usize,
}

impl BatchLabel {
    pub fn heading(&self) -> String {
        format!("## 🤖 Code Review: Batch {} of {}", self.ordinal, self.total)
    }
}

impl std::fmt::Display for BatchLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Batch {}", self.ordinal)
    }
}

/// Destination for the per-batch markdown report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn post_report(&self, label: BatchLabel, body: &str) -> anyhow::Result<()>;
}

/// Results of one completed batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub label: BatchLabel,
    pub results: Vec<FileReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every completed batch, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub batches: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn total_files(&self) -> usize {
        self.batches.iter().map(|b| b.results.len()).sum()
    }

    pub fn failed_files(&self) -> usize {
        self.batches
            .iter()
            .flat_map(|b| b.results.iter())
            .filter(|r| r.is_failed())
            .count()
    }

    /// Accumulation errors reported by any batch.
    pub fn errors(&self) -> Vec<String> {
        self.batches.iter().filter_map(|b| b.error.clone()).collect()
    }

    /// All reviews concatenated in batch order.
    pub fn into_results(self) -> Vec<FileReview> {
        self.batches.into_iter().flat_map(|b| b.results).collect()
    }
}

/// Split files into consecutive groups of at most `size`, keeping order.
pub fn partition(files: Vec<FileTask>, size: usize) -> Result<Vec<Vec<FileTask>>> {
    if size == 0 {
        return Err(BatchError::InvalidBatchSize(size));
    }
    Ok(files.chunks(size).map(|chunk| chunk.to_vec()).collect())
}

/// Runs the pipeline batch by batch and posts a report after each one.
pub struct BatchCoordinator {
    pipeline: ReviewPipeline,
    batch_size: usize,
    label_batches: bool,
}

impl BatchCoordinator {
    pub fn new(pipeline: ReviewPipeline) -> Self {
        Self {
            pipeline,
            batch_size: DEFAULT_BATCH_SIZE,
            label_batches: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Prefix each report with its batch heading when there is more than one batch.
    pub fn label_batches(mut self, enabled: bool) -> Self {
        self.label_batches = enabled;
        self
    }

    /// Review all files and post one report per batch.
    ///
    /// Reports already posted stay posted if a later batch fails.
    pub async fn run_all(&self, files: Vec<FileTask>, sink: &dyn ReportSink) -> Result<BatchReport> {
        if files.is_empty() {
            warn!("No valid files to review");
            return Err(BatchError::NoValidFiles);
        }

        // Each file costs three transitions; a full batch must fit under the ceiling.
        if self.batch_size.saturating_mul(3) > self.pipeline.max_steps() {
            warn!(
                "Batch size {} cannot finish within {} pipeline steps",
                self.batch_size,
                self.pipeline.max_steps()
            );
            return Err(BatchError::InvalidBatchSize(self.batch_size));
        }

        let total_files = files.len();
        let groups = partition(files, self.batch_size)?;
        let total = groups.len();
        info!(
            "Reviewing {} files in {} batch(es) of up to {}",
            total_files, total, self.batch_size
        );

        let mut report = BatchReport::default();

        for (i, group) in groups.into_iter().enumerate() {
            let label = BatchLabel {
                ordinal: i + 1,
                total,
            };
            info!("{} of {}: reviewing {} files", label, total, group.len());

            let output = self
                .pipeline
                .run(group)
                .instrument(info_span!("batch", ordinal = label.ordinal, total))
                .await?;
            if let Some(ref e) = output.error {
                warn!("{} recorded an accumulation error: {}", label, e);
            }

            let body = self.report_body(label, &render_markdown(&output.results));
            if let Err(e) = sink.post_report(label, &body).await {
                error!("Failed to post report for {}: {:#}", label, e);
                return Err(BatchError::Sink {
                    batch: label.ordinal,
                    message: format!("{e:#}"),
                });
            }

            report.batches.push(BatchOutcome {
                label,
                results: output.results,
                error: output.error,
            });
        }

        info!(
            "Batch review complete: {} files, {} failed",
            report.total_files(),
            report.failed_files()
        );

        Ok(report)
    }

    fn report_body(&self, label: BatchLabel, markdown: &str) -> String {
        if self.label_batches && label.total > 1 {
            format!("{}\n\n{}", label.heading(), markdown)
        } else {
            markdown.to_string()
        }
    }
}
