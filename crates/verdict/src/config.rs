//! Project configuration file support for verdict.
//!
//! Loads configuration from `verdict.toml` in the working directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use verdict_criteria::Criterion;

/// Project-level configuration loaded from `verdict.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Model CLI backend ("claude" or "opencode")
    pub model_cli: Option<String>,
    /// Model name passed to the backend
    pub model: Option<String>,
    /// Path to the backend binary when it is not on PATH
    pub model_binary: Option<PathBuf>,
    /// Evaluation prompt with {input}, {submission}, {criteria} and
    /// {reference} slots, replacing the built-in instruction
    pub prompt_template: Option<String>,
    /// Catalog criteria to evaluate when none are given on the command line
    #[serde(default)]
    pub criteria: Vec<String>,
    /// Named principles to evaluate as criteria
    #[serde(default)]
    pub principles: Vec<String>,
    /// Custom criterion descriptions, keyed by name. A name that is also
    /// listed in `criteria` overrides the catalog description.
    #[serde(default)]
    pub custom_criteria: BTreeMap<String, String>,
    /// Refuse evaluations without a reference
    pub requires_reference: Option<bool>,
    /// Per-call model timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Extra environment variables for the backend process
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "verdict.toml";

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Criteria configured in the file: listed names first (with any custom
    /// override), then remaining custom criteria, then principles.
    pub fn criteria(&self) -> Result<Vec<Criterion>> {
        let mut criteria = Vec::new();

        for name in &self.criteria {
            match self.custom_criteria.get(name) {
                Some(description) => criteria.push(Criterion::described(name, description)),
                None => criteria.push(Criterion::named(name)),
            }
        }
        for (name, description) in &self.custom_criteria {
            if !self.criteria.contains(name) {
                criteria.push(Criterion::described(name, description));
            }
        }
        for name in &self.principles {
            criteria.push(Criterion::principle(name)?);
        }

        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_criteria::CriteriaSet;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_unknown_field_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "agent = \"claude\"\n").unwrap();
        assert!(ProjectConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_criteria_merge_order_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
model_cli = "opencode"
model = "gpt-4o"
criteria = ["conciseness", "depth"]
principles = ["criminal"]
requires_reference = true

[custom_criteria]
depth = "Does the answer explain why?"
tone = "Is the answer polite?"
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.model_cli.as_deref(), Some("opencode"));
        assert_eq!(config.requires_reference, Some(true));

        let set = CriteriaSet::resolve(config.criteria().unwrap()).unwrap();
        assert_eq!(set.names(), vec!["conciseness", "depth", "tone", "criminal"]);
        assert_eq!(set.description("depth"), Some("Does the answer explain why?"));
    }

    #[test]
    fn test_backend_settings_parse() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
model_binary = "/opt/claude/bin/claude"
prompt_template = "Judge {submission} against {criteria}"

[env]
NO_COLOR = "1"
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.model_binary.as_deref(),
            Some(Path::new("/opt/claude/bin/claude"))
        );
        assert_eq!(
            config.prompt_template.as_deref(),
            Some("Judge {submission} against {criteria}")
        );
        assert_eq!(config.env.get("NO_COLOR").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_unknown_principle_in_config_is_error() {
        let config = ProjectConfig {
            principles: vec!["nope".into()],
            ..Default::default()
        };
        assert!(config.criteria().is_err());
    }
}
