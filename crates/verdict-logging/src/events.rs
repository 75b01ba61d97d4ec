use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for criteria evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    BatchStarted {
        dataset: Option<PathBuf>,
        records: usize,
        criteria: Vec<String>,
        model: String,
    },
    EvaluationStarted {
        index: usize,
        submission_preview: String,
    },
    VerdictParsed {
        index: usize,
        value: String,
        score: Option<u8>,
        verdict: String,
    },
    ErrorEncountered {
        index: usize,
        error: String,
    },
    BatchInterrupted {
        evaluated: usize,
    },
    BatchCompleted {
        evaluated: usize,
        passed: usize,
        failed: usize,
        unknown: usize,
        errors: usize,
        pass_rate: Option<f64>,
        duration_secs: f64,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for verdict events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::BatchStarted {
                dataset,
                records,
                criteria,
                model,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "verdict".bold().bright_white(),
                    format!("({} records)", records).dimmed()
                );
                if let Some(path) = dataset {
                    let _ = writeln!(
                        stderr,
                        "  {} {}",
                        "Dataset:".dimmed(),
                        path.display().to_string().dimmed()
                    );
                }
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "Criteria:".dimmed(),
                    criteria.join(", ").dimmed()
                );
                let _ = writeln!(stderr, "  {} {}", "Model:".dimmed(), model.dimmed());
                let _ = writeln!(stderr);
            }
            LogEvent::EvaluationStarted {
                index,
                submission_preview,
            } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {}",
                    "▶".bright_cyan(),
                    format!("#{}", index + 1).bright_cyan().bold(),
                    submission_preview.dimmed()
                );
            }
            LogEvent::VerdictParsed { score, verdict, .. } => {
                let styled = match score {
                    Some(1) => format!("✓ {}", verdict).bright_green().to_string(),
                    Some(_) => format!("✗ {}", verdict).bright_red().to_string(),
                    None => format!("? {}", verdict).bright_yellow().to_string(),
                };
                let _ = writeln!(stderr, "    {}", styled);
            }
            LogEvent::ErrorEncountered { index, error } => {
                let _ = writeln!(
                    stderr,
                    "    {} Error in record {}: {}",
                    "✗".bright_red(),
                    index + 1,
                    error.bright_red()
                );
            }
            LogEvent::BatchInterrupted { evaluated } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Interrupted after {} record(s)",
                    "⚠".bright_yellow(),
                    evaluated
                );
            }
            LogEvent::BatchCompleted { .. } => {
                // Printed by the caller as the final summary
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::BatchStarted { records, .. } => {
                format!("[{}] batch:start {} records", timestamp, records)
            }
            LogEvent::EvaluationStarted { index, .. } => {
                format!("[{}] eval:start:{}", timestamp, index + 1)
            }
            LogEvent::VerdictParsed { index, value, .. } => {
                format!("[{}] eval:done:{} {}", timestamp, index + 1, value)
            }
            LogEvent::ErrorEncountered { index, error } => {
                format!("[{}] error:{}:{}", timestamp, index + 1, error)
            }
            LogEvent::BatchInterrupted { evaluated } => {
                format!("[{}] batch:interrupted:{}", timestamp, evaluated)
            }
            LogEvent::BatchCompleted {
                evaluated,
                passed,
                duration_secs,
                ..
            } => format!(
                "[{}] batch:done {}/{} passed {:.1}s",
                timestamp, passed, evaluated, duration_secs
            ),
        };
        let _ = writeln!(stderr, "{}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let event = LogEvent::VerdictParsed {
            index: 0,
            value: "Y".into(),
            score: Some(1),
            verdict: "Y".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "verdict_parsed");
        assert_eq!(json["score"], 1);
    }

    #[test]
    fn test_file_logging_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("verdict.jsonl");
        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();

        logger.log(&LogEvent::EvaluationStarted {
            index: 0,
            submission_preview: "hello".into(),
        });
        logger.log(&LogEvent::BatchInterrupted { evaluated: 1 });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "evaluation_started");
        assert!(lines[1]["timestamp"].is_string());
    }
}
