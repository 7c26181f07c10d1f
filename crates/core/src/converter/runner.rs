//! Encoder process invocation.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConversionError;
use crate::metrics::ENCODER_INVOCATIONS;

/// What an encoder run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard error.
    pub stderr: String,
}

impl EncoderOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the external encoder with a prepared argument list.
#[async_trait]
pub trait EncoderRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs the encoder to completion.
    ///
    /// A nonzero exit is reported through [`EncoderOutput`], not as an error.
    async fn run(&self, args: &[String]) -> Result<EncoderOutput, ConversionError>;

    /// Validates that the encoder is available.
    async fn validate(&self) -> Result<(), ConversionError>;
}

/// Runs the ffmpeg binary as a child process.
pub struct FfmpegRunner {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegRunner {
    pub fn new(ffmpeg_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            timeout,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.timeout())
    }

    fn spawn_error(&self, e: std::io::Error) -> ConversionError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConversionError::conversion_failed(format!(
                "FFmpeg not found at path: {}",
                self.ffmpeg_path.display()
            ))
        } else {
            ConversionError::conversion_failed(format!("Failed to start ffmpeg: {}", e))
        }
    }
}

#[async_trait]
impl EncoderRunner for FfmpegRunner {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn run(&self, args: &[String]) -> Result<EncoderOutput, ConversionError> {
        debug!(ffmpeg = %self.ffmpeg_path.display(), ?args, "Running encoder");

        let child = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ENCODER_INVOCATIONS.with_label_values(&["error"]).inc();
                self.spawn_error(e)
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                ENCODER_INVOCATIONS.with_label_values(&["error"]).inc();
                return Err(ConversionError::conversion_failed(format!(
                    "Failed to wait for ffmpeg: {}",
                    e
                )));
            }
            Err(_) => {
                ENCODER_INVOCATIONS.with_label_values(&["timeout"]).inc();
                return Err(ConversionError::EncoderTimeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let result = EncoderOutput {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        let label = if result.success() { "success" } else { "failed" };
        ENCODER_INVOCATIONS.with_label_values(&[label]).inc();

        Ok(result)
    }

    async fn validate(&self) -> Result<(), ConversionError> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.success() {
            return Err(ConversionError::conversion_failed(format!(
                "ffmpeg -version exited with code: {:?}",
                output.code()
            )));
        }

        Ok(())
    }
}
