use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use verdict_criteria::{EvaluationRequest, EvaluationResult};

/// Shared state for one batch run
#[derive(Debug, Clone)]
pub struct BatchContext {
    /// Requests to evaluate, in order
    pub requests: Vec<EvaluationRequest>,
    /// Where the requests were loaded from, if anywhere
    pub dataset: Option<PathBuf>,
    /// Results recorded so far
    pub results: Vec<RecordResult>,
    started_at: Instant,
}

/// Outcome of evaluating one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub index: usize,
    pub submission: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EvaluationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordResult {
    pub fn evaluated(index: usize, submission: &str, result: EvaluationResult) -> Self {
        Self {
            index,
            submission: submission.to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(index: usize, submission: &str, error: String) -> Self {
        Self {
            index,
            submission: submission.to_string(),
            result: None,
            error: Some(error),
        }
    }
}

impl BatchContext {
    pub fn new(requests: Vec<EvaluationRequest>) -> Self {
        Self {
            requests,
            dataset: None,
            results: Vec::new(),
            started_at: Instant::now(),
        }
    }

    pub fn with_dataset(mut self, path: PathBuf) -> Self {
        self.dataset = Some(path);
        self
    }

    pub fn push_result(&mut self, result: RecordResult) {
        self.results.push(result);
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }
}
