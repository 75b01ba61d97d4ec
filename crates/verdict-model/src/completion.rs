use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text returned by a model call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The completion text (process stdout for CLI backends)
    pub text: String,
    /// Diagnostic output (process stderr for CLI backends)
    pub stderr: String,
    /// Exit code from the backend process, 0 for in-process models
    pub exit_code: i32,
    /// Duration of the call
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl Completion {
    pub fn new(text: String, stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            text,
            stderr,
            exit_code,
            duration,
        }
    }

    /// A successful completion with no diagnostics
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(text.into(), String::new(), 0, Duration::ZERO)
    }

    /// Check if the backend exited successfully
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
