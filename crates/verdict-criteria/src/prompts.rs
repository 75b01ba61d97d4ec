use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::{CriteriaError, CriteriaSet, EvaluationRequest};

lazy_static! {
    static ref SLOT: Regex =
        Regex::new(r"\{(input|submission|output|criteria|reference)\}").expect("valid regex");
}

/// Prompt templates for criteria evaluation
pub struct CriteriaPrompts;

impl CriteriaPrompts {
    /// Build the joint criteria evaluation prompt.
    ///
    /// The `[Input]` and `[Reference]` sections are only rendered when the
    /// request carries them.
    pub fn build_evaluation_prompt(criteria: &CriteriaSet, request: &EvaluationRequest) -> String {
        let mut data = String::from("[BEGIN DATA]\n***\n");

        if let Some(ref input) = request.input {
            data.push_str(&format!("[Input]: {}\n***\n", input));
        }
        data.push_str(&format!("[Submission]: {}\n***\n", request.submission));
        data.push_str(&format!("[Criteria]: {}\n***\n", criteria.render()));
        if let Some(ref reference) = request.reference {
            data.push_str(&format!("[Reference]: {}\n***\n", reference));
        }
        data.push_str("[END DATA]");

        format!(
            r#"You are assessing a submitted answer on a given task or input based on a set of criteria. Here is the data:
{data}
Does the submission meet the Criteria? First, write out in a step by step manner your reasoning about each criterion to be sure that your conclusion is correct. Avoid simply stating the correct answers at the outset. Then print only the single character "Y" or "N" (without quotes or brackets) on its own line corresponding to the correct answer of whether the submission meets all criteria. At the end, repeat just the letter again by itself on a new line."#,
            data = data,
        )
    }
}

/// A caller-supplied evaluation prompt with `{input}`, `{submission}`
/// (or `{output}`), `{criteria}` and `{reference}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Check that the template can show the model what to judge
    pub fn new(text: impl Into<String>) -> Result<Self, CriteriaError> {
        let text = text.into();
        if !text.contains("{submission}") && !text.contains("{output}") {
            return Err(CriteriaError::InvalidTemplate(
                "missing a {submission} or {output} slot".into(),
            ));
        }
        if !text.contains("{criteria}") {
            return Err(CriteriaError::InvalidTemplate(
                "missing a {criteria} slot".into(),
            ));
        }
        Ok(Self { text })
    }

    pub fn uses_reference(&self) -> bool {
        self.text.contains("{reference}")
    }

    /// Fill every slot in one pass so slot-like text in the data is left alone.
    /// A missing input renders as empty.
    pub fn render(
        &self,
        criteria: &CriteriaSet,
        request: &EvaluationRequest,
    ) -> Result<String, CriteriaError> {
        if self.uses_reference() && request.reference.is_none() {
            return Err(CriteriaError::InvalidTemplate(
                "template uses {reference} but no reference was supplied".into(),
            ));
        }

        let rendered_criteria = criteria.render();
        let prompt = SLOT.replace_all(&self.text, |caps: &Captures| match &caps[1] {
            "input" => request.input.clone().unwrap_or_default(),
            "criteria" => rendered_criteria.clone(),
            "reference" => request.reference.clone().unwrap_or_default(),
            _ => request.submission.clone(),
        });
        Ok(prompt.into_owned())
    }
}
