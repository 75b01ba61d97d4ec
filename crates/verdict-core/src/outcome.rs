use serde::{Deserialize, Serialize};
use std::time::Duration;
use verdict_logging::RunSummary;

use crate::RecordResult;

/// Pass/fail tallies over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub evaluated: usize,
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[RecordResult]) -> Self {
        let mut summary = Self::default();
        for record in results {
            summary.evaluated += 1;
            match record.result.as_ref().map(|r| r.score) {
                Some(Some(1)) => summary.passed += 1,
                Some(Some(_)) => summary.failed += 1,
                Some(None) => summary.unknown += 1,
                None => summary.errors += 1,
            }
        }
        summary
    }

    /// Share of classified verdicts that passed. Unknown verdicts and
    /// errors are excluded; None when nothing was classified.
    pub fn pass_rate(&self) -> Option<f64> {
        let classified = self.passed + self.failed;
        if classified == 0 {
            None
        } else {
            Some(self.passed as f64 / classified as f64)
        }
    }
}

impl From<BatchSummary> for RunSummary {
    fn from(summary: BatchSummary) -> Self {
        RunSummary {
            evaluated: summary.evaluated,
            passed: summary.passed,
            failed: summary.failed,
            unknown: summary.unknown,
            errors: summary.errors,
            pass_rate: summary.pass_rate(),
        }
    }
}

/// The final outcome of a batch run
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Every record was attempted
    Completed {
        summary: BatchSummary,
        pass_rate: Option<f64>,
        results: Vec<RecordResult>,
        total_duration_secs: f64,
    },
    /// User requested stop (e.g., Ctrl+C)
    Interrupted {
        summary: BatchSummary,
        pass_rate: Option<f64>,
        results: Vec<RecordResult>,
        total_duration_secs: f64,
    },
}

impl BatchOutcome {
    pub fn completed(results: Vec<RecordResult>, duration: Duration) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self::Completed {
            summary,
            pass_rate: summary.pass_rate(),
            results,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn interrupted(results: Vec<RecordResult>, duration: Duration) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self::Interrupted {
            summary,
            pass_rate: summary.pass_rate(),
            results,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn summary(&self) -> &BatchSummary {
        match self {
            Self::Completed { summary, .. } => summary,
            Self::Interrupted { summary, .. } => summary,
        }
    }

    pub fn results(&self) -> &[RecordResult] {
        match self {
            Self::Completed { results, .. } => results,
            Self::Interrupted { results, .. } => results,
        }
    }

    pub fn total_duration_secs(&self) -> f64 {
        match self {
            Self::Completed {
                total_duration_secs,
                ..
            } => *total_duration_secs,
            Self::Interrupted {
                total_duration_secs,
                ..
            } => *total_duration_secs,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Interrupted { .. } => "interrupted",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed { .. } => 0,
            Self::Interrupted { .. } => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_criteria::EvaluationResult;

    fn record(index: usize, text: &str) -> RecordResult {
        RecordResult::evaluated(index, "s", EvaluationResult::parse(text))
    }

    #[test]
    fn test_summary_tallies_each_kind() {
        let results = vec![
            record(0, "ok\nY"),
            record(1, "ok\nY"),
            record(2, "bad\nN"),
            record(3, "unsure"),
            RecordResult::failed(4, "s", "Model error: boom".into()),
        ];
        let summary = BatchSummary::from_results(&results);

        assert_eq!(summary.evaluated, 5);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.errors, 1);
        let rate = summary.pass_rate().unwrap();
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pass_rate_absent_without_classified_results() {
        let summary = BatchSummary::from_results(&[record(0, "no idea")]);
        assert_eq!(summary.pass_rate(), None);
    }

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(BatchOutcome::completed(vec![], Duration::ZERO).exit_code(), 0);
        assert_eq!(BatchOutcome::interrupted(vec![], Duration::ZERO).exit_code(), 130);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = BatchOutcome::completed(vec![record(0, "Y")], Duration::from_secs(1));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["summary"]["passed"], 1);
        assert_eq!(json["pass_rate"], 1.0);
    }
}
