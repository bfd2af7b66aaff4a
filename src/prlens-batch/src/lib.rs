//! Sequential review pipeline for pull requests.
//!
//! Provides:
//! - A per-file state machine (analyze, collect, advance) with isolated failures
//! - A batch coordinator that splits large file sets and posts a report per batch

pub mod batch;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use batch::{
    BatchCoordinator, BatchLabel, BatchOutcome, BatchReport, DEFAULT_BATCH_SIZE, ReportSink,
    partition,
};
pub use pipeline::{
    DEFAULT_MAX_STEPS, PipelineOutput, PipelineState, ReviewPipeline, Stage, collect,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No valid files to review")]
    NoValidFiles,
    #[error("Pipeline requires at least one file")]
    EmptyBatch,
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),
    #[error("Pipeline exceeded its step limit of {limit}")]
    StepLimitExceeded { limit: usize },
    #[error("Failed to post report for batch {batch}: {message}")]
    Sink { batch: usize, message: String },
}

pub type Result<T> = std::result::Result<T, BatchError>;
