use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, MergeError};
use super::{MediaCommand, MediaCommandBuilder, MediaMetadata, MediaProcessorTrait};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_path);

        Self {
            config,
            command_builder,
        }
    }

    fn time_limit(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn timeout_error(&self, command: &MediaCommand) -> MergeError {
        MergeError::Timeout {
            stage: command.description.clone(),
            seconds: self.config.timeout_secs,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    /// Run one engine stage, logging progress until it exits
    async fn execute_command(&self, command: &MediaCommand) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", command.binary_path, command.args);

        let mut child = AsyncCommand::new(&command.binary_path)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MergeError::Engine(format!("Failed to execute media processor: {}", e)))?;

        // Drain stderr on its own task so a chatty engine never blocks on a full pipe
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                if let Err(e) = stderr.read_to_end(&mut buf).await {
                    warn!("Failed to read engine stderr: {}", e);
                }
            }
            // Engine output may carry file names in any encoding
            String::from_utf8_lossy(&buf).into_owned()
        });

        let stdout = child.stdout.take();
        let description = command.description.clone();
        let waited = tokio::time::timeout(self.time_limit(), async {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(seconds) = parse_progress_line(&line) {
                        debug!("{} progress: {:.1}s rendered", description, seconds);
                    }
                }
            }
            child.wait().await
        })
        .await;

        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                warn!("{} exceeded {}s, killing engine", command.description, self.config.timeout_secs);
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(self.timeout_error(command));
            }
        };

        let stderr = stderr_task.await.unwrap_or_default();
        if !status.success() {
            return Err(MergeError::Engine(format!(
                "{} failed: {}",
                command.description,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Read the container duration with ffprobe
    async fn probe(&self, path: &Path) -> Result<MediaMetadata> {
        let command = self.command_builder.probe(path);
        debug!("Probing {}", path.display());

        let mut probe = AsyncCommand::new(&command.binary_path);
        probe.args(&command.args).stdin(Stdio::null()).kill_on_drop(true);

        let output = tokio::time::timeout(self.time_limit(), probe.output())
            .await
            .map_err(|_| self.timeout_error(&command))?
            .map_err(|e| MergeError::Probe(format!("Failed to execute probe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MergeError::Probe(stderr.trim().to_string()));
        }

        parse_probe_output(&output.stdout)
    }

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| MergeError::Engine(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(MergeError::Engine("Media processor version check failed".to_string()))
        }
    }

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String> {
        let command = self.command_builder.version_check();

        let output = AsyncCommand::new(&command.binary_path)
            .args(&command.args)
            .output()
            .await
            .map_err(|e| MergeError::Engine(format!("Failed to execute media processor: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // The first line carries the version
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MergeError::Engine(format!("Media processor version check failed: {}", stderr)))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Extract metadata from `ffprobe -print_format json` output
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaMetadata> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MergeError::Probe(format!("Unreadable probe output: {}", e)))?;

    let duration = probe
        .format
        .and_then(|format| format.duration)
        .and_then(|duration| duration.trim().parse::<f64>().ok())
        .ok_or_else(|| MergeError::Probe("Probe output has no container duration".to_string()))?;

    Ok(MediaMetadata { duration })
}

/// Seconds rendered so far, from an `out_time_us=`/`out_time_ms=` progress line
fn parse_progress_line(line: &str) -> Option<f64> {
    // ffmpeg reports microseconds under both keys
    let value = line
        .strip_prefix("out_time_us=")
        .or_else(|| line.strip_prefix("out_time_ms="))?;
    value.trim().parse::<i64>().ok().map(|us| us as f64 / 1_000_000.0)
}
