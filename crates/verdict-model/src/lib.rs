mod claude;
mod completion;
mod opencode;
mod spawner;
mod traits;

pub use claude::ClaudeCodeModel;
pub use completion::Completion;
pub use opencode::OpenCodeModel;
pub use spawner::ProcessSpawner;
pub use traits::{Model, ModelConfig, ModelError, ModelType};

use std::path::PathBuf;

/// Create a CLI-backed model by type, optionally at a non-default binary path
pub fn create_model(model_type: ModelType, binary: Option<PathBuf>) -> Box<dyn Model> {
    match (model_type, binary) {
        (ModelType::ClaudeCode, Some(path)) => Box::new(ClaudeCodeModel::with_binary_path(path)),
        (ModelType::ClaudeCode, None) => Box::new(ClaudeCodeModel::new()),
        (ModelType::OpenCode, Some(path)) => Box::new(OpenCodeModel::with_binary_path(path)),
        (ModelType::OpenCode, None) => Box::new(OpenCodeModel::new()),
    }
}
