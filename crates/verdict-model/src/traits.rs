use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::Completion;

/// Errors that can occur while asking a model for a completion
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to spawn model process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model not found at path: {0}")]
    NotFound(String),

    #[error("Model call failed: {0}")]
    ExecutionFailed(String),
}

/// Configuration for a single completion call
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Working directory for the model process
    pub working_dir: PathBuf,
    /// Optional timeout (None = no limit)
    pub timeout: Option<Duration>,
    /// Additional environment variables
    pub env_vars: HashMap<String, String>,
    /// Model name to request (if the backend supports it)
    pub model: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            timeout: None,
            env_vars: HashMap::new(),
            model: None,
        }
    }
}

impl ModelConfig {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.env_vars.insert(key, value);
        self
    }
}

/// Supported CLI model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    ClaudeCode,
    OpenCode,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::ClaudeCode => write!(f, "claude-code"),
            ModelType::OpenCode => write!(f, "opencode"),
        }
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" | "claude-code" | "claudecode" => Ok(ModelType::ClaudeCode),
            "opencode" | "open-code" => Ok(ModelType::OpenCode),
            _ => Err(format!("Unknown model backend: {}", s)),
        }
    }
}

/// A text-completion capability: given a prompt, return a completion.
///
/// Implementations own transport, timeouts and retries. Callers treat a
/// returned error as final.
#[async_trait]
pub trait Model: Send + Sync {
    /// Human-readable name of the model backend (e.g., "Claude Code")
    fn name(&self) -> &str;

    /// Produce one completion for the given prompt
    async fn complete(&self, prompt: &str, config: &ModelConfig)
        -> Result<Completion, ModelError>;

    /// Check if the backend is usable on this system
    async fn is_available(&self) -> bool {
        true
    }
}
