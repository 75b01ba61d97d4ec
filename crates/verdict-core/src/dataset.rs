use std::path::Path;
use tracing::debug;
use verdict_criteria::EvaluationRequest;

use crate::BatchError;

/// Load evaluation requests from a JSONL file, one request per line.
/// Blank lines are skipped.
pub fn load_dataset(path: &Path) -> Result<Vec<EvaluationRequest>, BatchError> {
    let content = std::fs::read_to_string(path)?;
    let requests = parse_dataset(&content)?;
    debug!(path = %path.display(), records = requests.len(), "Loaded dataset");
    Ok(requests)
}

fn parse_dataset(content: &str) -> Result<Vec<EvaluationRequest>, BatchError> {
    let mut requests = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request = serde_json::from_str(line).map_err(|source| BatchError::MalformedLine {
            line: number + 1,
            source,
        })?;
        requests.push(request);
    }

    if requests.is_empty() {
        return Err(BatchError::EmptyDataset);
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_skips_blank_lines() {
        let content = r#"{"submission": "a"}

{"submission": "b", "input": "q", "reference": "r"}
"#;
        let requests = parse_dataset(content).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].input.as_deref(), Some("q"));
        assert_eq!(requests[1].reference.as_deref(), Some("r"));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let content = "{\"submission\": \"a\"}\n{not json}\n";
        match parse_dataset(content) {
            Err(BatchError::MalformedLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(matches!(parse_dataset("\n\n"), Err(BatchError::EmptyDataset)));
    }

    #[test]
    fn test_load_dataset_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        std::fs::write(&path, "{\"submission\": \"x\"}\n").unwrap();

        let requests = load_dataset(&path).unwrap();
        assert_eq!(requests, vec![EvaluationRequest::new("x")]);
    }
}
