//! Analysis invoker.
//!
//! Sends one file to the language model and turns whatever comes back into a
//! [`FileReview`]. Every failure (bad input, transport error, timeout,
//! malformed JSON) is folded into the review as an error string, so one file
//! can never abort the files reviewed alongside it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{FileReview, FileTask, Issue, ReviewDocument, UNKNOWN_FILENAME};
use crate::{Result, ReviewError, prompts};

/// Default bound on a single model call.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(120);

/// External text-analysis capability: prompt in, response text out.
#[async_trait]
pub trait AnalysisCapability: Send + Sync {
    async fn invoke(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Reviews files one at a time through an [`AnalysisCapability`].
#[derive(Clone)]
pub struct Analyzer {
    capability: Arc<dyn AnalysisCapability>,
    timeout: Option<Duration>,
}

impl Analyzer {
    pub fn new(capability: Arc<dyn AnalysisCapability>) -> Self {
        Self {
            capability,
            timeout: Some(DEFAULT_ANALYSIS_TIMEOUT),
        }
    }

    /// Bound each model call. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Review one file. Never fails; errors become the review text.
    pub async fn analyze(&self, file: &FileTask) -> FileReview {
        if let Err(e) = file.validate() {
            warn!(error = %e, "Rejecting malformed file task");
            return FileReview::failed(UNKNOWN_FILENAME, e.to_string());
        }

        if file.is_blank() {
            debug!(file = %file.filename, "Skipping model call for empty file");
            return FileReview::structured(&file.filename, ReviewDocument::empty());
        }

        match self.review(file).await {
            Ok(document) => {
                debug!(
                    file = %file.filename,
                    issues = document.issues().count(),
                    "Review parsed"
                );
                FileReview::structured(&file.filename, document)
            }
            Err(e) => {
                warn!(file = %file.filename, error = %e, "Review degraded to error text");
                FileReview::failed(&file.filename, e.to_string())
            }
        }
    }

    /// Review the file under the pipeline cursor, if there is one.
    pub async fn analyze_current(&self, current: Option<&FileTask>) -> FileReview {
        match current {
            Some(file) => self.analyze(file).await,
            None => {
                let e = ReviewError::MissingField("current_file");
                warn!(error = %e, "No file under the cursor");
                FileReview::failed(UNKNOWN_FILENAME, e.to_string())
            }
        }
    }

    async fn review(&self, file: &FileTask) -> Result<ReviewDocument> {
        let prompt = prompts::build_review_prompt(&file.filename, &file.content);
        let response = self.invoke(&prompt).await?;
        parse_review(&file.filename, &response)
    }

    async fn invoke(&self, prompt: &str) -> Result<String> {
        let call = self.capability.invoke(prompt);

        let outcome = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| ReviewError::Timeout {
                    timeout_secs: timeout.as_secs(),
                })?,
            None => call.await,
        };

        outcome.map_err(|e| ReviewError::Analysis(format!("{e:#}")))
    }
}

/// Parse a model response into the canonical document shape.
///
/// Accepts a document object or a bare issue list. When the response is not
/// JSON as a whole, the first fenced code block that parses is used, so a
/// fence wrapped in prose still counts.
pub fn parse_review(filename: &str, response: &str) -> Result<ReviewDocument> {
    let value = extract_json(response)?;

    match value {
        Value::Object(_) => Ok(serde_json::from_value(value)?),
        Value::Array(items) => {
            let issues: Vec<Issue> = items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect();
            Ok(ReviewDocument::from_issues(filename, issues))
        }
        other => Err(ReviewError::UnexpectedShape(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn extract_json(response: &str) -> Result<Value> {
    let trimmed = response.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(e) => fenced_blocks(trimmed)
            .into_iter()
            .find_map(|block| serde_json::from_str(block).ok())
            .ok_or(ReviewError::MalformedResponse(e)),
    }
}

/// Bodies of the markdown code fences in `text`, in order.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        // Skip the info string ("json") on the opening fence line.
        let Some(newline) = after_fence.find('\n') else {
            break;
        };
        let body = &after_fence[newline + 1..];
        let Some(close) = body.find("```") else {
            break;
        };
        blocks.push(body[..close].trim());
        rest = &body[close + 3..];
    }

    blocks
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
