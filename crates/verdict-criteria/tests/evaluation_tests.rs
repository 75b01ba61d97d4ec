use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use verdict_criteria::{
    catalog, principle, CriteriaError, CriteriaEvaluator, CriteriaPrompts, CriteriaSet, Criterion,
    EvaluationError, EvaluationRequest,
};
use verdict_model::{Completion, Model, ModelConfig, ModelError};

/// Deterministic model: always returns the same reply and records prompts.
struct FixedModel {
    reply: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FixedModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Model for FixedModel {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn complete(&self, prompt: &str, _config: &ModelConfig) -> Result<Completion, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Completion::from_text(self.reply.clone()))
    }
}

/// Model whose transport always fails.
struct UnreachableModel;

#[async_trait]
impl Model for UnreachableModel {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _prompt: &str, _config: &ModelConfig) -> Result<Completion, ModelError> {
        Err(ModelError::Timeout(std::time::Duration::from_secs(30)))
    }
}

#[test]
fn test_every_catalog_criterion_renders_verbatim() {
    let names: Vec<&str> = catalog().iter().map(|e| e.name).collect();
    let set = CriteriaSet::from_names(&names).unwrap();
    let prompt =
        CriteriaPrompts::build_evaluation_prompt(&set, &EvaluationRequest::new("anything"));

    for entry in catalog() {
        assert!(prompt.contains(&format!("{}: {}", entry.name, entry.description)));
    }
}

#[tokio::test]
async fn test_identical_requests_produce_identical_results() {
    let model = FixedModel::new("Step 1: it is short.\nStep 2: it is clear.\nY\nY");
    let set = CriteriaSet::from_names(&["conciseness", "coherence"]).unwrap();
    let evaluator = CriteriaEvaluator::new(&model, set);
    let request = EvaluationRequest::new("The answer is 42.").with_input("What is the answer?");

    let first = evaluator.evaluate(&request).await.unwrap();
    let second = evaluator.evaluate(&request).await.unwrap();

    assert_eq!(first, second);
    let prompts = model.prompts.lock().unwrap();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn test_principle_critique_used_as_description() {
    let model = FixedModel::new("Nothing harmful found, so the answer is N");
    let harmful = principle("harmful1").unwrap().clone();
    let critique = harmful.critique_request.clone();
    let set = CriteriaSet::resolve(vec![Criterion::from(harmful)]).unwrap();
    let evaluator = CriteriaEvaluator::new(&model, set);

    let result = evaluator
        .evaluate(&EvaluationRequest::new("Have a nice day."))
        .await
        .unwrap();

    assert_eq!(result.value, "N");
    assert_eq!(result.score, Some(0));
    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].contains(&format!("harmful1: {}", critique)));
}

#[tokio::test]
async fn test_unparseable_reply_is_soft_failure() {
    let model = FixedModel::new("The submission partly meets the criteria.\nVerdict: unclear");
    let evaluator =
        CriteriaEvaluator::new(&model, CriteriaSet::from_names(&["detail"]).unwrap());

    let result = evaluator
        .evaluate(&EvaluationRequest::new("text"))
        .await
        .unwrap();

    assert!(result.is_unknown());
    assert_eq!(result.value, "Verdict: unclear");
    assert_eq!(result.reasoning, "The submission partly meets the criteria.");
}

#[tokio::test]
async fn test_model_errors_propagate_unchanged() {
    let model = UnreachableModel;
    let evaluator =
        CriteriaEvaluator::new(&model, CriteriaSet::from_names(&["depth"]).unwrap());

    let err = evaluator
        .evaluate(&EvaluationRequest::new("text"))
        .await
        .unwrap_err();

    assert!(matches!(err, EvaluationError::Model(ModelError::Timeout(_))));
}

#[tokio::test]
async fn test_requires_reference_flag_checked_with_zero_calls() {
    let model = FixedModel::new("Y");
    let evaluator = CriteriaEvaluator::new(&model, CriteriaSet::from_names(&["depth"]).unwrap())
        .requires_reference(true);

    let err = evaluator
        .evaluate(&EvaluationRequest::new("text").with_input("q"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EvaluationError::Config(CriteriaError::MissingReference)
    ));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unknown_principle_rejected() {
    assert_eq!(
        Criterion::principle("be-nice"),
        Err(CriteriaError::UnknownPrinciple("be-nice".into()))
    );
}
