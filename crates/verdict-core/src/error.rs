use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Invalid record {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: verdict_criteria::EvaluationError,
    },

    #[error("Failed to read dataset: {0}")]
    DatasetError(#[from] std::io::Error),

    #[error("Malformed dataset line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dataset is empty")]
    EmptyDataset,
}
