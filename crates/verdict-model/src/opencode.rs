use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::{Completion, Model, ModelConfig, ModelError, ProcessSpawner};

/// Completions from the OpenCode CLI
pub struct OpenCodeModel {
    binary_path: PathBuf,
}

impl OpenCodeModel {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("opencode"),
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self { binary_path: path }
    }
}

impl Default for OpenCodeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Model for OpenCodeModel {
    fn name(&self) -> &str {
        "OpenCode"
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

        // OpenCode uses the "run" subcommand for non-interactive execution
        let mut args = vec!["run"];

        if let Some(ref model) = config.model {
            args.push("--model");
            args.push(model);
        }

        args.push("--prompt");
        args.push(prompt);

        ProcessSpawner::spawn(&self.binary_path, &args, config).await
    }
}
