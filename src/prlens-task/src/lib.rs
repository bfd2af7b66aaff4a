//! Pull request review task.
//!
//! The body of one review job: parse the repository address, gather the
//! changed files, run them through the batch coordinator (posting a comment
//! per batch) and report a completed or failed outcome. Fetching, model
//! access and comment posting are supplied by the caller through the
//! [`FileSource`], [`AnalysisCapability`](prlens_review::AnalysisCapability)
//! and [`CommentSink`] traits.

pub mod config;
pub mod logging;
pub mod repo;
pub mod sink;
pub mod source;
pub mod task;

pub use config::ReviewConfig;
pub use logging::init_logging;
pub use repo::{PullRequestContext, parse_repo_url};
pub use sink::{CommentSink, PullRequestSink};
pub use source::{ChangedFile, FileSource, gather_files};
pub use task::{ReviewTask, TaskOutcome, TaskRequest, TaskResults, TaskStatus};

use prlens_batch::BatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Source(String),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, TaskError>;
