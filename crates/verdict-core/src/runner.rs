use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use verdict_criteria::{CriteriaEvaluator, EvaluationRequest};
use verdict_logging::{LogEvent, Logger, RunWriter};

use crate::context::{BatchContext, RecordResult};
use crate::error::BatchError;
use crate::outcome::{BatchOutcome, BatchSummary};

/// Evaluates a sequence of requests against one criteria set
pub struct BatchRunner<'a> {
    evaluator: &'a CriteriaEvaluator<'a>,
    logger: Arc<Logger>,
    recorder: Option<RunWriter>,
    interrupted: Arc<AtomicBool>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(evaluator: &'a CriteriaEvaluator<'a>, logger: Arc<Logger>) -> Self {
        Self {
            evaluator,
            logger,
            recorder: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Record every result to a JSONL run file
    pub fn with_recorder(mut self, recorder: RunWriter) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn recorder(&self) -> Option<&RunWriter> {
        self.recorder.as_ref()
    }

    /// Get a handle to signal interruption
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Run every request in order. Configuration problems in any record
    /// fail the batch before the first model call; model failures are
    /// recorded per record and the batch continues.
    pub async fn run(&self, mut context: BatchContext) -> Result<BatchOutcome, BatchError> {
        self.validate(&context.requests)?;

        let criteria: Vec<String> = self
            .evaluator
            .criteria()
            .names()
            .into_iter()
            .map(String::from)
            .collect();

        self.logger.log(&LogEvent::BatchStarted {
            dataset: context.dataset.clone(),
            records: context.requests.len(),
            criteria: criteria.clone(),
            model: self.evaluator.model_name().to_string(),
        });
        if let Some(ref recorder) = self.recorder {
            recorder.write_start(
                context.dataset.as_deref(),
                &criteria,
                self.evaluator.model_name(),
                self.evaluator.is_reference_required(),
            );
        }

        let requests = std::mem::take(&mut context.requests);
        for (index, request) in requests.iter().enumerate() {
            if self.interrupted.load(Ordering::SeqCst) {
                info!(evaluated = index, "Batch interrupted by user");
                self.logger
                    .log(&LogEvent::BatchInterrupted { evaluated: index });
                let duration = context.total_duration();
                let outcome = BatchOutcome::interrupted(context.results, duration);
                self.finish(&outcome);
                return Ok(outcome);
            }

            let record = self.evaluate_record(index, request).await;
            context.push_result(record);
        }

        let duration = context.total_duration();
        let outcome = BatchOutcome::completed(context.results, duration);
        self.finish(&outcome);
        Ok(outcome)
    }

    fn validate(&self, requests: &[EvaluationRequest]) -> Result<(), BatchError> {
        if requests.is_empty() {
            return Err(BatchError::EmptyDataset);
        }
        for (index, request) in requests.iter().enumerate() {
            self.evaluator
                .prompt_for(request)
                .map_err(|source| BatchError::InvalidRecord { index, source })?;
        }
        Ok(())
    }

    async fn evaluate_record(&self, index: usize, request: &EvaluationRequest) -> RecordResult {
        self.logger.log(&LogEvent::EvaluationStarted {
            index,
            submission_preview: request.submission.chars().take(60).collect(),
        });

        debug!(index, "Evaluating record");
        match self.evaluator.evaluate(request).await {
            Ok(result) => {
                self.logger.log(&LogEvent::VerdictParsed {
                    index,
                    value: result.value.clone(),
                    score: result.score,
                    verdict: result.short_description(),
                });
                if let Some(ref recorder) = self.recorder {
                    recorder.write_record(
                        index,
                        &request.submission,
                        Some(&result.value),
                        result.score,
                        Some(&result.reasoning),
                        None,
                    );
                }
                RecordResult::evaluated(index, &request.submission, result)
            }
            Err(e) => {
                warn!(index, error = %e, "Evaluation failed");
                let error = e.to_string();
                self.logger.log(&LogEvent::ErrorEncountered {
                    index,
                    error: error.clone(),
                });
                if let Some(ref recorder) = self.recorder {
                    recorder.write_record(
                        index,
                        &request.submission,
                        None,
                        None,
                        None,
                        Some(&error),
                    );
                }
                RecordResult::failed(index, &request.submission, error)
            }
        }
    }

    fn finish(&self, outcome: &BatchOutcome) {
        let summary: BatchSummary = *outcome.summary();
        self.logger.log(&LogEvent::BatchCompleted {
            evaluated: summary.evaluated,
            passed: summary.passed,
            failed: summary.failed,
            unknown: summary.unknown,
            errors: summary.errors,
            pass_rate: summary.pass_rate(),
            duration_secs: outcome.total_duration_secs(),
        });
        if let Some(ref recorder) = self.recorder {
            recorder.write_end(
                outcome.status(),
                summary.into(),
                outcome.total_duration_secs(),
            );
        }
    }
}
