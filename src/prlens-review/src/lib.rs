//! Per-file code review for pull requests.
//!
//! Provides:
//! - The review data model (file tasks, issues, per-file reviews)
//! - The review prompt sent to the language model
//! - The analysis invoker, which never fails past its boundary
//! - The markdown report renderer

pub mod analyzer;
pub mod prompts;
pub mod render;
pub mod types;

pub use analyzer::{AnalysisCapability, Analyzer, parse_review};
pub use prompts::build_review_prompt;
pub use render::render_markdown;
pub use types::{
    CodeReview, FileFindings, FileReview, FileTask, Issue, IssueType, ReviewDocument,
    ReviewSummary, UNKNOWN_FILENAME,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Raw text of the capability's own error.
    #[error("{0}")]
    Analysis(String),
    #[error("analysis timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
    /// Raw text of the JSON parse error.
    #[error("{0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("unexpected review response shape: {0}")]
    UnexpectedShape(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
