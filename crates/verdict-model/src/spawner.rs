use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, trace};

use crate::{Completion, ModelConfig, ModelError};

/// Utility for running CLI model backends
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn a process and capture its output as a completion
    pub async fn spawn(
        binary: &Path,
        args: &[&str],
        config: &ModelConfig,
    ) -> Result<Completion, ModelError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            arg_count = args.len(),
            working_dir = %config.working_dir.display(),
            "Spawning model process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(&config.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        for (key, value) in &config.env_vars {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ModelError::NotFound(binary.display().to_string()),
            _ => ModelError::SpawnFailed(e),
        })?;

        let (text, stderr, exit_code) = match config.timeout {
            Some(limit) => tokio::time::timeout(limit, Self::collect(child))
                .await
                .map_err(|_| ModelError::Timeout(limit))??,
            None => Self::collect(child).await?,
        };
        let duration = start.elapsed();

        debug!(
            exit_code,
            duration_ms = duration.as_millis(),
            "Model process completed"
        );

        Ok(Completion::new(text, stderr, exit_code, duration))
    }

    async fn collect(mut child: Child) -> Result<(String, String, i32), ModelError> {
        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| ModelError::ExecutionFailed("stdout not captured".into()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| ModelError::ExecutionFailed("stderr not captured".into()))?;

        let mut stdout_reader = BufReader::new(stdout_handle).lines();
        let mut stderr_reader = BufReader::new(stderr_handle).lines();

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut stderr_open = true;

        // Read both streams concurrently
        loop {
            tokio::select! {
                biased;

                result = stdout_reader.next_line() => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stdout");
                            push_line(&mut stdout, &line);
                        }
                        Ok(None) => {
                            // stdout closed, drain stderr
                            while let Ok(Some(line)) = stderr_reader.next_line().await {
                                trace!(line = %line, "stderr");
                                push_line(&mut stderr, &line);
                            }
                            break;
                        }
                        Err(e) => {
                            return Err(ModelError::ExecutionFailed(format!(
                                "Failed to read stdout: {}",
                                e
                            )));
                        }
                    }
                }
                result = stderr_reader.next_line(), if stderr_open => {
                    match result {
                        Ok(Some(line)) => {
                            trace!(line = %line, "stderr");
                            push_line(&mut stderr, &line);
                        }
                        Ok(None) => stderr_open = false,
                        Err(e) => {
                            return Err(ModelError::ExecutionFailed(format!(
                                "Failed to read stderr: {}",
                                e
                            )));
                        }
                    }
                }
            }
        }

        let status = child.wait().await?;
        Ok((stdout, stderr, status.code().unwrap_or(-1)))
    }
}

fn push_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(line);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config() -> ModelConfig {
        ModelConfig::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_spawn_captures_stdout_and_exit_code() {
        let completion = ProcessSpawner::spawn(
            Path::new("sh"),
            &["-c", "echo 'step one'; echo Y; echo oops >&2; exit 0"],
            &config(),
        )
        .await
        .unwrap();

        assert_eq!(completion.text, "step one\nY");
        assert_eq!(completion.stderr, "oops");
        assert!(completion.success());
    }

    #[tokio::test]
    async fn test_spawn_reports_nonzero_exit() {
        let completion = ProcessSpawner::spawn(Path::new("sh"), &["-c", "exit 3"], &config())
            .await
            .unwrap();
        assert_eq!(completion.exit_code, 3);
    }

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let result = ProcessSpawner::spawn(
            &PathBuf::from("verdict-definitely-not-installed"),
            &[],
            &config(),
        )
        .await;
        assert!(matches!(result, Err(ModelError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_spawn_times_out() {
        let config = config().with_timeout(Duration::from_millis(100));
        let result = ProcessSpawner::spawn(Path::new("sh"), &["-c", "sleep 5"], &config).await;
        assert!(matches!(result, Err(ModelError::Timeout(_))));
    }
}
