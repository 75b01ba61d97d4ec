use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::{Completion, Model, ModelConfig, ModelError, ProcessSpawner};

/// Completions from the Claude Code CLI in print mode
pub struct ClaudeCodeModel {
    binary_path: PathBuf,
}

impl ClaudeCodeModel {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("claude"),
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self { binary_path: path }
    }

    fn build_args<'a>(prompt: &'a str, config: &'a ModelConfig) -> Vec<&'a str> {
        // Non-interactive mode, output only
        let mut args = vec!["--print"];

        if let Some(ref model) = config.model {
            args.push("--model");
            args.push(model);
        }

        // Prompts starting with '-' must not be read as options
        args.push("--");
        args.push(prompt);
        args
    }
}

impl Default for ClaudeCodeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Model for ClaudeCodeModel {
    fn name(&self) -> &str {
        "Claude Code"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn complete(&self, prompt: &str, config: &ModelConfig) -> Result<Completion, ModelError> {
        debug!(model = self.name(), prompt_len = prompt.len(), "Requesting completion");

        let args = Self::build_args(prompt, config);
        ProcessSpawner::spawn(&self.binary_path, &args, config).await
    }
}
