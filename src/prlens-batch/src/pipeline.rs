//! Per-file review state machine.
//!
//! A run walks its files strictly in order:
//!
//! ```text
//! Analyzing(i) -> Collecting(i) -> Advancing(i) -> Analyzing(i + 1) | Done
//! ```
//!
//! Every transition is total. Failures inside the loop become data in the
//! results list, so a completed run always holds exactly one review per file,
//! in input order. The only way a run fails is by exceeding its step limit.

use prlens_review::{Analyzer, FileReview, FileTask, UNKNOWN_FILENAME};
use tracing::{Instrument, debug, info_span, warn};

use crate::{BatchError, Result};

/// Default ceiling on transitions per run.
pub const DEFAULT_MAX_STEPS: usize = 150;

/// Review text recorded when a file's outcome went missing before collection.
pub const MISSING_OUTCOME: &str = "Error: current_result missing";

/// Position of a run in its per-file loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Analyzing(usize),
    Collecting(usize),
    Advancing(usize),
    Done,
}

/// State owned by a single pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub files: Vec<FileTask>,
    /// Progress cursor. Always `<= files.len()`.
    pub index: usize,
    /// The file under the cursor; `Some` iff `index < files.len()`.
    pub current: Option<FileTask>,
    /// Append-only; one entry per collected file.
    pub results: Vec<FileReview>,
    /// Outcome produced by analysis and waiting to be collected.
    pub outcome: Option<FileReview>,
    /// Last accumulation problem, if any.
    pub error: Option<String>,
}

impl PipelineState {
    pub fn new(files: Vec<FileTask>) -> Result<Self> {
        let current = files.first().cloned().ok_or(BatchError::EmptyBatch)?;
        Ok(Self {
            results: Vec::with_capacity(files.len()),
            files,
            index: 0,
            current: Some(current),
            outcome: None,
            error: None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.files.len()
    }

    fn last_known_filename(&self) -> String {
        self.current
            .as_ref()
            .or_else(|| self.files.get(self.index))
            .map(|f| f.filename.clone())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_FILENAME.to_string())
    }
}

/// Append one file's outcome to the results.
///
/// Always grows `results` by exactly one. A missing outcome is replaced by a
/// placeholder review; a results list that has drifted from the cursor is
/// recorded in `error` and the review is appended anyway.
pub fn collect(mut state: PipelineState, outcome: Option<FileReview>) -> PipelineState {
    let review = match outcome {
        Some(review) => review,
        None => {
            warn!(index = state.index, "Outcome missing at collection, recording placeholder");
            FileReview::failed(state.last_known_filename(), MISSING_OUTCOME)
        }
    };

    if state.results.len() != state.index {
        let message = format!(
            "results out of sync with cursor: {} entries collected before file {}",
            state.results.len(),
            state.index
        );
        warn!("{}", message);
        state.error = Some(message);
    }

    state.results.push(review);
    state
}

/// Results of a finished run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub results: Vec<FileReview>,
    pub error: Option<String>,
    pub steps: usize,
}

/// Drives [`PipelineState`] from the first file to `Done`.
#[derive(Clone)]
pub struct ReviewPipeline {
    analyzer: Analyzer,
    max_steps: usize,
}

impl ReviewPipeline {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Execute a single transition.
    pub async fn step(&self, mut state: PipelineState, stage: Stage) -> (PipelineState, Stage) {
        match stage {
            Stage::Analyzing(i) => {
                let outcome = self.analyzer.analyze_current(state.current.as_ref()).await;
                state.outcome = Some(outcome);
                (state, Stage::Collecting(i))
            }
            Stage::Collecting(i) => {
                let outcome = state.outcome.take();
                (collect(state, outcome), Stage::Advancing(i))
            }
            Stage::Advancing(i) => {
                let next = i + 1;
                state.index = next.min(state.files.len());
                state.current = state.files.get(next).cloned();
                if state.current.is_some() {
                    (state, Stage::Analyzing(next))
                } else {
                    (state, Stage::Done)
                }
            }
            Stage::Done => (state, Stage::Done),
        }
    }

    /// Review every file in order. `files` must not be empty.
    pub async fn run(&self, files: Vec<FileTask>) -> Result<PipelineOutput> {
        let span = info_span!("review_pipeline", files = files.len());
        self.run_inner(files).instrument(span).await
    }

    async fn run_inner(&self, files: Vec<FileTask>) -> Result<PipelineOutput> {
        let mut state = PipelineState::new(files)?;
        let mut stage = Stage::Analyzing(0);
        let mut steps = 0usize;

        while stage != Stage::Done {
            if steps >= self.max_steps {
                warn!(limit = self.max_steps, "Pipeline step limit reached");
                return Err(BatchError::StepLimitExceeded {
                    limit: self.max_steps,
                });
            }
            (state, stage) = self.step(state, stage).await;
            steps += 1;
        }

        debug!(steps, results = state.results.len(), "Pipeline finished");

        Ok(PipelineOutput {
            results: state.results,
            error: state.error,
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedCapability, files};
    use pretty_assertions::assert_eq;

    fn pipeline() -> ReviewPipeline {
        ReviewPipeline::new(Analyzer::new(ScriptedCapability::new()))
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        let input = vec![
            FileTask::new("a.py", "x=1"),
            FileTask::new("b.py", "FAIL"),
            FileTask::new("c.py", "INVALID"),
            FileTask::new("d.py", ""),
        ];

        let output = pipeline().run(input.clone()).await.unwrap();

        assert_eq!(output.results.len(), input.len());
        for (file, review) in input.iter().zip(&output.results) {
            assert_eq!(review.filename, file.filename);
        }
        assert!(!output.results[0].is_failed());
        assert!(output.results[1].is_failed());
        assert!(output.results[2].is_failed());
        assert!(!output.results[3].is_failed());
        assert_eq!(output.steps, 12);
        assert!(output.error.is_none());
    }

    #[tokio::test]
    async fn test_single_file_scenario() {
        let output = pipeline()
            .run(vec![FileTask::new("a.py", "x=1")])
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&output.results).unwrap(),
            serde_json::json!([{
                "filename": "a.py",
                "code_review": {"files": [], "summary": {"total_issues": 0, "critical_issues": 0}}
            }])
        );
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = pipeline().run(Vec::new()).await.unwrap_err();
        assert!(matches!(err, BatchError::EmptyBatch));
    }

    #[tokio::test]
    async fn test_step_limit() {
        let err = pipeline()
            .with_max_steps(5)
            .run(files(2))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::StepLimitExceeded { limit: 5 }));

        let output = pipeline().with_max_steps(6).run(files(2)).await.unwrap();
        assert_eq!(output.results.len(), 2);
    }

    #[tokio::test]
    async fn test_default_limit_fits_fifty_files() {
        let output = pipeline().run(files(50)).await.unwrap();
        assert_eq!(output.results.len(), 50);
        assert_eq!(output.steps, DEFAULT_MAX_STEPS);
    }

    #[tokio::test]
    async fn test_cursor_invariants_hold_after_every_step() {
        let pipeline = pipeline();
        let mut state = PipelineState::new(files(3)).unwrap();
        let mut stage = Stage::Analyzing(0);

        while stage != Stage::Done {
            (state, stage) = pipeline.step(state, stage).await;
            assert!(state.index <= state.files.len());
            assert_eq!(state.current.is_some(), state.index < state.files.len());
        }

        assert!(state.is_complete());
        assert_eq!(state.results.len(), 3);

        let (state, stage) = pipeline.step(state, Stage::Done).await;
        assert_eq!(stage, Stage::Done);
        assert_eq!(state.results.len(), 3);
    }

    #[test]
    fn test_collect_appends_outcome() {
        let state = PipelineState::new(vec![FileTask::new("file1.py", "x")]).unwrap();

        let state = collect(state, Some(FileReview::failed("file1.py", "Looks good")));

        assert_eq!(state.results, vec![FileReview::failed("file1.py", "Looks good")]);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_collect_missing_outcome() {
        let state = PipelineState::new(vec![FileTask::new("file2.py", "x")]).unwrap();

        let state = collect(state, None);

        assert_eq!(
            state.results,
            vec![FileReview::failed("file2.py", MISSING_OUTCOME)]
        );
    }

    #[test]
    fn test_collect_missing_outcome_without_current() {
        let mut state = PipelineState::new(vec![FileTask::new("", "x")]).unwrap();
        state.current = None;

        let state = collect(state, None);

        assert_eq!(state.results[0].filename, UNKNOWN_FILENAME);
    }

    #[test]
    fn test_collect_out_of_sync_records_error() {
        let mut state = PipelineState::new(vec![FileTask::new("file3.py", "x")]).unwrap();
        state.results.push(FileReview::failed("stray.py", "left over"));

        let state = collect(state, Some(FileReview::failed("file3.py", "bad")));

        assert_eq!(state.results.len(), 2);
        assert_eq!(state.results[1].filename, "file3.py");
        assert!(state.error.unwrap().contains("out of sync"));
    }
}
