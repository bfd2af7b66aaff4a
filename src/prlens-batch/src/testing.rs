//! Fakes shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prlens_review::{AnalysisCapability, FileTask};

use crate::batch::{BatchLabel, ReportSink};

pub const EMPTY_REVIEW: &str = r#"{"files":[],"summary":{"total_issues":0,"critical_issues":0}}"#;

/// Answers by file content: `FAIL` raises, `INVALID` returns non-JSON,
/// anything else gets an empty review.
pub struct ScriptedCapability {
    pub calls: AtomicUsize,
}

impl ScriptedCapability {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AnalysisCapability for ScriptedCapability {
    async fn invoke(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("Code:\nFAIL") {
            anyhow::bail!("LLM crashed");
        }
        if prompt.contains("Code:\nINVALID") {
            return Ok("INVALID_JSON".to_string());
        }
        Ok(EMPTY_REVIEW.to_string())
    }
}

/// Records every posted report; optionally fails on one batch ordinal.
#[derive(Default)]
pub struct RecordingSink {
    pub posted: Mutex<Vec<(BatchLabel, String)>>,
    pub fail_on: Option<usize>,
}

impl RecordingSink {
    pub fn failing_on(ordinal: usize) -> Self {
        Self {
            posted: Mutex::new(Vec::new()),
            fail_on: Some(ordinal),
        }
    }

    pub fn posted(&self) -> Vec<(BatchLabel, String)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn post_report(&self, label: BatchLabel, body: &str) -> anyhow::Result<()> {
        if self.fail_on == Some(label.ordinal) {
            anyhow::bail!("post fail");
        }
        self.posted.lock().unwrap().push((label, body.to_string()));
        Ok(())
    }
}

pub fn files(count: usize) -> Vec<FileTask> {
    (0..count)
        .map(|i| FileTask::new(format!("file{i}.py"), format!("x = {i}")))
        .collect()
}
