use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Each line type in a run JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunLine {
    RunStart {
        timestamp: DateTime<Utc>,
        dataset: Option<PathBuf>,
        criteria: Vec<String>,
        model: String,
        requires_reference: bool,
    },
    Record {
        index: usize,
        submission: String,
        value: Option<String>,
        score: Option<u8>,
        reasoning: Option<String>,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    RunEnd {
        outcome: String,
        #[serde(flatten)]
        summary: RunSummary,
        duration_secs: f64,
        timestamp: DateTime<Utc>,
    },
}

/// Tallies written at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub evaluated: usize,
    pub passed: usize,
    pub failed: usize,
    pub unknown: usize,
    pub errors: usize,
    pub pass_rate: Option<f64>,
}

/// Writes a batch run as JSONL, by default under ~/.local/share/verdict/runs/.
pub struct RunWriter {
    file: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl RunWriter {
    /// Create a writer in the platform data directory. The file name is the
    /// current UTC timestamp plus a short hash of the criteria names.
    pub fn new(criteria: &[String]) -> io::Result<Self> {
        Self::in_dir(&Self::runs_dir()?, criteria)
    }

    /// Create a writer in an explicit directory
    pub fn in_dir(dir: &Path, criteria: &[String]) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let timestamp_str = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();

        let mut hasher = Sha256::new();
        hasher.update(criteria.join("\n").as_bytes());
        let hash = hex::encode(hasher.finalize());
        let short_hash = &hash[..6];

        let path = dir.join(format!("{}_{}.jsonl", timestamp_str, short_hash));
        let file = File::create(&path)?;

        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Returns the path to the run file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_start(
        &self,
        dataset: Option<&Path>,
        criteria: &[String],
        model: &str,
        requires_reference: bool,
    ) {
        self.write_line(&RunLine::RunStart {
            timestamp: Utc::now(),
            dataset: dataset.map(Path::to_path_buf),
            criteria: criteria.to_vec(),
            model: model.to_string(),
            requires_reference,
        });
    }

    /// Write one evaluated record. `value`, `score` and `reasoning` come from
    /// the parsed verdict; `error` is set instead when the evaluation failed.
    pub fn write_record(
        &self,
        index: usize,
        submission: &str,
        value: Option<&str>,
        score: Option<u8>,
        reasoning: Option<&str>,
        error: Option<&str>,
    ) {
        self.write_line(&RunLine::Record {
            index,
            submission: submission.to_string(),
            value: value.map(String::from),
            score,
            reasoning: reasoning.map(String::from),
            error: error.map(String::from),
            timestamp: Utc::now(),
        });
    }

    pub fn write_end(&self, outcome: &str, summary: RunSummary, duration_secs: f64) {
        self.write_line(&RunLine::RunEnd {
            outcome: outcome.to_string(),
            summary,
            duration_secs,
            timestamp: Utc::now(),
        });
    }

    fn write_line(&self, line: &RunLine) {
        if let Ok(json) = serde_json::to_string(line) {
            if let Ok(mut writer) = self.file.lock() {
                let _ = writeln!(writer, "{}", json);
                let _ = writer.flush();
            }
        }
    }

    fn runs_dir() -> io::Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine data directory",
            )
        })?;
        Ok(data_dir.join("verdict").join("runs"))
    }
}
