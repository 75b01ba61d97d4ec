use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

lazy_static! {
    static ref VERDICT_TOKEN: Regex =
        Regex::new(r"\b[YN]\b").expect("Invalid verdict token regex pattern");
}

/// Structured outcome of one criteria evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The model's free-text reasoning preceding its verdict
    pub reasoning: String,
    /// "Y", "N", or the raw trailing text when no verdict was found
    pub value: String,
    /// 1 for "Y", 0 for "N", absent when the reply could not be classified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
}

impl EvaluationResult {
    /// Parse a verdict out of a model completion.
    ///
    /// The last isolated `Y` or `N` token wins. When neither appears the
    /// last non-empty line becomes the value and the score is absent; this
    /// never fails.
    pub fn parse(completion: &str) -> Self {
        debug!(output_len = completion.len(), "Parsing criteria verdict");

        match VERDICT_TOKEN.find_iter(completion).last() {
            Some(token) => {
                let value = token.as_str().to_string();
                let score = if value == "Y" { 1 } else { 0 };
                let reasoning = strip_repeated_verdicts(&completion[..token.start()]);
                debug!(value = %value, "Found verdict token");
                Self {
                    reasoning,
                    value,
                    score: Some(score),
                }
            }
            None => Self::unclassified(completion),
        }
    }

    fn unclassified(completion: &str) -> Self {
        let trimmed = completion.trim();
        let (reasoning, value) = match trimmed.rfind('\n') {
            Some(pos) => (trimmed[..pos].trim(), trimmed[pos + 1..].trim()),
            None => ("", trimmed),
        };
        debug!(value, "No verdict token found");
        Self {
            reasoning: reasoning.to_string(),
            value: value.to_string(),
            score: None,
        }
    }

    /// True when the submission met every criterion
    pub fn passed(&self) -> bool {
        self.score == Some(1)
    }

    /// True when the reply could not be classified
    pub fn is_unknown(&self) -> bool {
        self.score.is_none()
    }

    /// Get a short description of the verdict for logging
    pub fn short_description(&self) -> String {
        match self.score {
            Some(1) => "Y (meets all criteria)".to_string(),
            Some(_) => "N (fails at least one criterion)".to_string(),
            None => {
                let preview: String = self.value.chars().take(40).collect();
                format!("UNKNOWN ({:?})", preview)
            }
        }
    }
}

/// Trim reasoning and drop trailing lines that only repeat a verdict letter
fn strip_repeated_verdicts(text: &str) -> String {
    let mut reasoning = text.trim();
    loop {
        let (rest, last_line) = match reasoning.rfind('\n') {
            Some(pos) => (&reasoning[..pos], &reasoning[pos + 1..]),
            None => ("", reasoning),
        };
        match last_line.trim() {
            "Y" | "N" => reasoning = rest.trim_end(),
            _ => break,
        }
        if reasoning.is_empty() {
            break;
        }
    }
    reasoning.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trailing_yes() {
        let output = "The submission is short.\nIt answers directly.\nY\nY";
        let result = EvaluationResult::parse(output);

        assert_eq!(result.value, "Y");
        assert_eq!(result.score, Some(1));
        assert_eq!(result.reasoning, "The submission is short.\nIt answers directly.");
        assert!(result.passed());
    }

    #[test]
    fn test_parse_trailing_no() {
        let output = "The submission rambles for three paragraphs.\nN";
        let result = EvaluationResult::parse(output);

        assert_eq!(result.value, "N");
        assert_eq!(result.score, Some(0));
        assert_eq!(result.reasoning, "The submission rambles for three paragraphs.");
        assert!(!result.passed());
        assert!(!result.is_unknown());
    }

    #[test]
    fn test_last_isolated_token_wins() {
        let output = "Criterion one: Y\nCriterion two: N\nOverall the answer is N";
        assert_eq!(EvaluationResult::parse(output).value, "N");

        let output = "At first I thought N, but on reflection Y.";
        let result = EvaluationResult::parse(output);
        assert_eq!(result.value, "Y");
        assert_eq!(result.reasoning, "At first I thought N, but on reflection");
    }

    #[test]
    fn test_tokens_inside_words_are_ignored() {
        let output = "Yes, No, YN, Nope, lowercase y and n";
        let result = EvaluationResult::parse(output);

        assert_eq!(result.score, None);
        assert_eq!(result.value, output);
        assert_eq!(result.reasoning, "");
    }

    #[test]
    fn test_unclassified_uses_last_line_as_value() {
        let output = "Some reasoning here.\n\nI cannot decide.\n";
        let result = EvaluationResult::parse(output);

        assert!(result.is_unknown());
        assert_eq!(result.value, "I cannot decide.");
        assert_eq!(result.reasoning, "Some reasoning here.");
    }

    #[test]
    fn test_empty_completion() {
        let result = EvaluationResult::parse("   \n");
        assert_eq!(result.value, "");
        assert_eq!(result.reasoning, "");
        assert_eq!(result.score, None);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let output = "Reasoning.\nY";
        assert_eq!(EvaluationResult::parse(output), EvaluationResult::parse(output));
    }

    #[test]
    fn test_serialization_omits_absent_score() {
        let unknown = EvaluationResult::parse("no verdict");
        let json = serde_json::to_value(&unknown).unwrap();
        assert!(json.get("score").is_none());
        assert_eq!(json["value"], "no verdict");

        let yes = EvaluationResult::parse("fine\nY");
        let json = serde_json::to_value(&yes).unwrap();
        assert_eq!(json["score"], 1);
        assert_eq!(json["reasoning"], "fine");
    }

    #[test]
    fn test_short_description() {
        assert!(EvaluationResult::parse("Y").short_description().starts_with('Y'));
        assert!(EvaluationResult::parse("N").short_description().starts_with('N'));
        assert!(EvaluationResult::parse("maybe")
            .short_description()
            .starts_with("UNKNOWN"));
    }
}
