use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use verdict_model::{Model, ModelConfig, ModelError};

use crate::{CriteriaError, CriteriaPrompts, CriteriaSet, EvaluationResult, PromptTemplate};

/// The text to judge plus optional context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub submission: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl EvaluationRequest {
    pub fn new(submission: impl Into<String>) -> Self {
        Self {
            submission: submission.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Judges submissions against a criteria set with one model call each
pub struct CriteriaEvaluator<'a> {
    model: &'a dyn Model,
    criteria: CriteriaSet,
    requires_reference: bool,
    template: Option<PromptTemplate>,
    config: ModelConfig,
}

impl<'a> CriteriaEvaluator<'a> {
    pub fn new(model: &'a dyn Model, criteria: CriteriaSet) -> Self {
        Self {
            model,
            criteria,
            requires_reference: false,
            template: None,
            config: ModelConfig::default(),
        }
    }

    /// An evaluator that refuses requests without a reference
    pub fn labeled(model: &'a dyn Model, criteria: CriteriaSet) -> Self {
        Self::new(model, criteria).requires_reference(true)
    }

    pub fn requires_reference(mut self, required: bool) -> Self {
        self.requires_reference = required;
        self
    }

    /// Replace the built-in instruction with a caller-supplied template
    pub fn with_prompt_template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_model_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn criteria(&self) -> &CriteriaSet {
        &self.criteria
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn is_reference_required(&self) -> bool {
        self.requires_reference
    }

    /// Validate the request and render the prompt without calling the model
    pub fn prompt_for(&self, request: &EvaluationRequest) -> Result<String, EvaluationError> {
        if self.requires_reference && request.reference.is_none() {
            return Err(CriteriaError::MissingReference.into());
        }
        match self.template {
            Some(ref template) => Ok(template.render(&self.criteria, request)?),
            None => Ok(CriteriaPrompts::build_evaluation_prompt(
                &self.criteria,
                request,
            )),
        }
    }

    /// Criteria that depend on ground truth the request does not carry
    pub fn unreferenced_criteria(&self, request: &EvaluationRequest) -> &[String] {
        if request.reference.is_some() {
            return &[];
        }
        self.criteria.criteria_needing_reference()
    }

    /// Judge one submission
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        let prompt = self.prompt_for(request)?;

        let unreferenced = self.unreferenced_criteria(request);
        if !unreferenced.is_empty() {
            warn!(
                criteria = ?unreferenced,
                "Criteria depend on ground truth but no reference was supplied"
            );
        }

        debug!(
            prompt_len = prompt.len(),
            criteria = self.criteria.len(),
            model = self.model.name(),
            "Running criteria evaluation"
        );

        let completion = self.model.complete(&prompt, &self.config).await?;

        info!(
            exit_code = completion.exit_code,
            duration_secs = completion.duration.as_secs_f64(),
            "Model completed"
        );

        if !completion.success() {
            return Err(EvaluationError::Model(ModelError::ExecutionFailed(format!(
                "{} exited with code {}: {}",
                self.model.name(),
                completion.exit_code,
                completion.stderr.trim()
            ))));
        }

        Ok(EvaluationResult::parse(&completion.text))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Evaluation configuration error: {0}")]
    Config(#[from] CriteriaError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}
