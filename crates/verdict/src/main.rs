mod config;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use verdict_core::{load_dataset, BatchContext, BatchOutcome, BatchRunner};
use verdict_criteria::{
    catalog, principles, CriteriaEvaluator, CriteriaSet, Criterion, EvaluationRequest,
    EvaluationResult, PromptTemplate,
};
use verdict_logging::{init_tracing, LogFormat, Logger, RunWriter};
use verdict_model::{create_model, Model, ModelConfig, ModelType};

use crate::config::ProjectConfig;

#[derive(Parser, Debug)]
#[command(
    name = "verdict",
    about = "Ask a language model whether text meets named criteria",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Working directory (default: current directory)
    #[arg(short = 'd', long, global = true)]
    working_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Tracing filter level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Also append structured events to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one submission
    Eval(EvalArgs),
    /// Evaluate every record of a JSONL dataset
    Batch(BatchArgs),
    /// List the built-in criteria
    Criteria,
    /// List the built-in principles
    Principles,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Submission text to judge
    #[arg(short, long, conflicts_with = "submission_file")]
    submission: Option<String>,

    /// Read the submission from a file
    #[arg(long)]
    submission_file: Option<PathBuf>,

    /// Input or question the submission responds to
    #[arg(short, long)]
    input: Option<String>,

    /// Ground-truth reference
    #[arg(short, long)]
    reference: Option<String>,

    #[command(flatten)]
    criteria: CriteriaArgs,

    /// Output the result as JSON
    #[arg(long)]
    json_output: bool,

    /// Print the rendered prompt without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// JSONL file with one {"submission", "input", "reference"} object per line
    #[arg(long)]
    dataset: PathBuf,

    #[command(flatten)]
    criteria: CriteriaArgs,

    /// Record the run as JSONL in the data directory
    #[arg(long)]
    record: bool,

    /// Output the outcome as JSON
    #[arg(long)]
    json_output: bool,
}

#[derive(Args, Debug)]
struct CriteriaArgs {
    /// Built-in criterion name (repeatable)
    #[arg(short = 'c', long = "criteria")]
    names: Vec<String>,

    /// Custom criterion as NAME=DESCRIPTION (repeatable)
    #[arg(long = "criterion", value_parser = parse_described)]
    described: Vec<(String, String)>,

    /// Built-in principle name used as a criterion (repeatable)
    #[arg(long = "principle")]
    principles: Vec<String>,

    /// Refuse to evaluate without a reference
    #[arg(long, conflicts_with = "no_requires_reference")]
    requires_reference: bool,

    /// Allow evaluation without a reference even if verdict.toml requires one
    #[arg(long)]
    no_requires_reference: bool,

    /// Model CLI backend
    #[arg(long, value_enum)]
    model_cli: Option<ModelChoice>,

    /// Model to use (if the backend supports it)
    #[arg(short, long)]
    model: Option<String>,

    /// Path to the backend binary (default: found on PATH)
    #[arg(long)]
    model_binary: Option<PathBuf>,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl CriteriaArgs {
    fn is_empty(&self) -> bool {
        self.names.is_empty() && self.described.is_empty() && self.principles.is_empty()
    }

    /// An explicit flag wins over the configured value
    fn requires_reference(&self, configured: Option<bool>) -> bool {
        if self.requires_reference {
            true
        } else if self.no_requires_reference {
            false
        } else {
            configured.unwrap_or(false)
        }
    }

    fn criteria(&self) -> Result<Vec<Criterion>> {
        let mut criteria: Vec<Criterion> = self.names.iter().map(Criterion::named).collect();
        criteria.extend(
            self.described
                .iter()
                .map(|(name, description)| Criterion::described(name, description)),
        );
        for name in &self.principles {
            criteria.push(Criterion::principle(name)?);
        }
        Ok(criteria)
    }
}

fn parse_described(s: &str) -> Result<(String, String), String> {
    let (name, description) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=DESCRIPTION, got '{}'", s))?;
    Ok((name.trim().to_string(), description.trim().to_string()))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelChoice {
    Claude,
    Opencode,
}

impl From<ModelChoice> for ModelType {
    fn from(choice: ModelChoice) -> Self {
        match choice {
            ModelChoice::Claude => ModelType::ClaudeCode,
            ModelChoice::Opencode => ModelType::OpenCode,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

/// Evaluation settings after merging flags over `verdict.toml`
struct Settings {
    criteria: CriteriaSet,
    requires_reference: bool,
    prompt_template: Option<PromptTemplate>,
    model_type: ModelType,
    model_binary: Option<PathBuf>,
    model_config: ModelConfig,
}

impl Settings {
    fn resolve(args: &CriteriaArgs, project: &ProjectConfig, working_dir: &Path) -> Result<Self> {
        // Flags replace the configured criteria rather than adding to them
        let criteria = if args.is_empty() {
            project.criteria()?
        } else {
            args.criteria()?
        };
        let criteria = CriteriaSet::resolve(criteria).context(
            "No usable criteria. Pass --criteria/--criterion/--principle or configure verdict.toml",
        )?;

        let model_type = match (args.model_cli, project.model_cli.as_deref()) {
            (Some(choice), _) => choice.into(),
            (None, Some(name)) => name
                .parse::<ModelType>()
                .map_err(anyhow::Error::msg)
                .context("Invalid model_cli in verdict.toml")?,
            (None, None) => ModelType::ClaudeCode,
        };

        let mut model_config = ModelConfig::new(working_dir.to_path_buf());
        if let Some(model) = args.model.clone().or_else(|| project.model.clone()) {
            model_config = model_config.with_model(model);
        }
        if let Some(secs) = args.timeout_secs.or(project.timeout_secs) {
            model_config = model_config.with_timeout(Duration::from_secs(secs));
        }
        for (key, value) in &project.env {
            model_config = model_config.with_env(key.clone(), value.clone());
        }

        let prompt_template = project
            .prompt_template
            .clone()
            .map(PromptTemplate::new)
            .transpose()
            .context("Invalid prompt_template in verdict.toml")?;

        Ok(Self {
            criteria,
            requires_reference: args.requires_reference(project.requires_reference),
            prompt_template,
            model_type,
            model_binary: args
                .model_binary
                .clone()
                .or_else(|| project.model_binary.clone()),
            model_config,
        })
    }

    fn build_model(&self) -> Box<dyn Model> {
        create_model(self.model_type, self.model_binary.clone())
    }

    fn into_evaluator(self, model: &dyn Model) -> CriteriaEvaluator<'_> {
        let evaluator = CriteriaEvaluator::new(model, self.criteria)
            .requires_reference(self.requires_reference)
            .with_model_config(self.model_config);
        match self.prompt_template {
            Some(template) => evaluator.with_prompt_template(template),
            None => evaluator,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format.into());

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), e);
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Command::Criteria => {
            print_catalog();
            Ok(0)
        }
        Command::Principles => {
            print_principles();
            Ok(0)
        }
        Command::Eval(ref args) => {
            let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();
            run_eval(args, &project, &working_dir).await
        }
        Command::Batch(ref args) => {
            let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();
            let logger = match cli.log_file {
                Some(ref path) => Logger::with_file(cli.log_format.into(), path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?,
                None => Logger::new(cli.log_format.into()),
            };
            run_batch(args, &project, &working_dir, Arc::new(logger)).await
        }
    }
}

async fn run_eval(args: &EvalArgs, project: &ProjectConfig, working_dir: &Path) -> Result<i32> {
    let settings = Settings::resolve(&args.criteria, project, working_dir)?;

    let mut request = EvaluationRequest::new(get_submission(args, working_dir)?);
    request.input = args.input.clone();
    request.reference = args.reference.clone();

    let model_type = settings.model_type;
    let model = settings.build_model();
    let evaluator = settings.into_evaluator(model.as_ref());

    if args.dry_run {
        let prompt = evaluator.prompt_for(&request)?;
        println!("=== Dry Run ===");
        println!("Model: {}", model_type);
        println!("Criteria: {}", evaluator.criteria().names().join(", "));
        println!();
        println!("{}", prompt);
        return Ok(0);
    }

    // Validate before checking the backend so configuration errors surface first
    evaluator.prompt_for(&request)?;
    ensure_available(model.as_ref()).await?;

    let result = evaluator.evaluate(&request).await?;

    if args.json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(match result.score {
        Some(1) => 0,
        Some(_) => 1,
        None => 3,
    })
}

async fn run_batch(
    args: &BatchArgs,
    project: &ProjectConfig,
    working_dir: &Path,
    logger: Arc<Logger>,
) -> Result<i32> {
    let settings = Settings::resolve(&args.criteria, project, working_dir)?;

    let dataset_path = if args.dataset.is_absolute() {
        args.dataset.clone()
    } else {
        working_dir.join(&args.dataset)
    };
    let requests = load_dataset(&dataset_path)
        .with_context(|| format!("Failed to load dataset {}", dataset_path.display()))?;

    let model = settings.build_model();
    ensure_available(model.as_ref()).await?;

    let evaluator = settings.into_evaluator(model.as_ref());

    let mut runner = BatchRunner::new(&evaluator, logger);
    if args.record {
        let names: Vec<String> = evaluator
            .criteria()
            .names()
            .into_iter()
            .map(String::from)
            .collect();
        let writer = RunWriter::new(&names).context("Failed to create run file")?;
        runner = runner.with_recorder(writer);
    }

    // Handle Ctrl+C gracefully
    let interrupt_handle = runner.interrupt_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Finishing current record...");
        interrupt_handle.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let context = BatchContext::new(requests).with_dataset(dataset_path);
    let outcome = runner.run(context).await?;

    if args.json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    if let Some(recorder) = runner.recorder() {
        eprintln!("Run recorded to {}", recorder.path().display());
    }

    Ok(outcome.exit_code())
}

async fn ensure_available(model: &dyn Model) -> Result<()> {
    if !model.is_available().await {
        anyhow::bail!(
            "Model backend '{}' is not available. Make sure it's installed and in PATH.",
            model.name()
        );
    }
    Ok(())
}

fn get_submission(args: &EvalArgs, working_dir: &Path) -> Result<String> {
    if let Some(ref submission) = args.submission {
        return Ok(submission.clone());
    }

    match args.submission_file {
        Some(ref file) => {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                working_dir.join(file)
            };
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(content.trim().to_string())
        }
        None => anyhow::bail!("No submission provided. Use --submission or --submission-file"),
    }
}

fn print_result(result: &EvaluationResult) {
    if !result.reasoning.is_empty() {
        println!("{}", result.reasoning);
        println!();
    }
    let verdict = match result.score {
        Some(1) => result.short_description().bright_green().bold(),
        Some(_) => result.short_description().bright_red().bold(),
        None => result.short_description().bright_yellow().bold(),
    };
    println!("Verdict: {}", verdict);
}

fn print_outcome(outcome: &BatchOutcome) {
    let summary = outcome.summary();
    let header = match outcome {
        BatchOutcome::Completed { .. } => "=== COMPLETED ===".bright_green(),
        BatchOutcome::Interrupted { .. } => "=== INTERRUPTED ===".bright_yellow(),
    };
    eprintln!();
    eprintln!("{}", header);
    eprintln!("Evaluated: {}", summary.evaluated);
    eprintln!("Passed:    {}", summary.passed);
    eprintln!("Failed:    {}", summary.failed);
    eprintln!("Unknown:   {}", summary.unknown);
    eprintln!("Errors:    {}", summary.errors);
    match summary.pass_rate() {
        Some(rate) => eprintln!("Pass rate: {:.1}%", rate * 100.0),
        None => eprintln!("Pass rate: n/a"),
    }
    eprintln!("Duration:  {:.1}s", outcome.total_duration_secs());
}

fn print_catalog() {
    for entry in catalog() {
        let marker = if entry.requires_reference {
            " (requires reference)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("{:<18}{}{}", entry.name.bold(), entry.description, marker);
    }
}

fn print_principles() {
    for principle in principles() {
        println!("{}", principle.name.bold());
        println!("  {}", principle.critique_request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_described() {
        assert_eq!(
            parse_described("tone = Is it polite? Yes=good").unwrap(),
            ("tone".to_string(), "Is it polite? Yes=good".to_string())
        );
        assert!(parse_described("no-separator").is_err());
    }

    #[test]
    fn test_cli_parses_eval_flags() {
        let cli = Cli::try_parse_from([
            "verdict",
            "eval",
            "-s",
            "42",
            "-c",
            "conciseness",
            "--criterion",
            "tone=Is it polite?",
            "--principle",
            "harmful1",
            "--requires-reference",
        ])
        .unwrap();

        match cli.command {
            Command::Eval(args) => {
                assert_eq!(args.submission.as_deref(), Some("42"));
                assert_eq!(args.criteria.names, vec!["conciseness"]);
                assert_eq!(args.criteria.described.len(), 1);
                assert!(args.criteria.requires_reference);
                assert_eq!(args.criteria.criteria().unwrap().len(), 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_project_config() {
        let project = ProjectConfig {
            model_cli: Some("opencode".into()),
            model: Some("from-file".into()),
            criteria: vec!["depth".into()],
            requires_reference: Some(true),
            ..Default::default()
        };
        let cli = Cli::try_parse_from([
            "verdict", "eval", "-s", "x", "-c", "detail", "-m", "from-flag",
        ])
        .unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };

        let settings = Settings::resolve(&args.criteria, &project, Path::new("/tmp")).unwrap();
        assert_eq!(settings.criteria.names(), vec!["detail"]);
        assert_eq!(settings.model_type, ModelType::OpenCode);
        assert_eq!(settings.model_config.model.as_deref(), Some("from-flag"));
        assert!(settings.requires_reference);
    }

    #[test]
    fn test_flag_can_lift_configured_reference_requirement() {
        let project = ProjectConfig {
            criteria: vec!["correctness".into()],
            requires_reference: Some(true),
            ..Default::default()
        };
        let cli = Cli::try_parse_from(["verdict", "eval", "-s", "x", "--no-requires-reference"])
            .unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };

        let settings = Settings::resolve(&args.criteria, &project, Path::new("/tmp")).unwrap();
        assert!(!settings.requires_reference);

        assert!(Cli::try_parse_from([
            "verdict",
            "eval",
            "-s",
            "x",
            "--requires-reference",
            "--no-requires-reference",
        ])
        .is_err());
    }

    #[test]
    fn test_configured_template_and_backend_settings() {
        let project = ProjectConfig {
            criteria: vec!["depth".into()],
            model_binary: Some(PathBuf::from("/opt/bin/claude")),
            prompt_template: Some("Judge {submission} on {criteria}".into()),
            env: [("NO_COLOR".to_string(), "1".to_string())].into_iter().collect(),
            ..Default::default()
        };
        let cli = Cli::try_parse_from(["verdict", "eval", "-s", "x"]).unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };

        let settings = Settings::resolve(&args.criteria, &project, Path::new("/tmp")).unwrap();
        assert_eq!(settings.model_binary, Some(PathBuf::from("/opt/bin/claude")));
        assert_eq!(
            settings.model_config.env_vars.get("NO_COLOR").map(String::as_str),
            Some("1")
        );

        let model = settings.build_model();
        let evaluator = settings.into_evaluator(model.as_ref());
        let prompt = evaluator.prompt_for(&EvaluationRequest::new("42")).unwrap();
        assert_eq!(
            prompt,
            "Judge 42 on depth: Does the submission demonstrate depth of thought?"
        );
    }

    #[test]
    fn test_template_without_criteria_slot_is_error() {
        let project = ProjectConfig {
            criteria: vec!["depth".into()],
            prompt_template: Some("Judge {submission}".into()),
            ..Default::default()
        };
        let cli = Cli::try_parse_from(["verdict", "eval", "-s", "x"]).unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert!(Settings::resolve(&args.criteria, &project, Path::new("/tmp")).is_err());
    }

    #[test]
    fn test_no_criteria_anywhere_is_error() {
        let cli = Cli::try_parse_from(["verdict", "eval", "-s", "x"]).unwrap();
        let Command::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert!(Settings::resolve(&args.criteria, &ProjectConfig::default(), Path::new("/tmp"))
            .is_err());
    }
}
