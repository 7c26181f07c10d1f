//! Mock encoder runner for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::converter::{ConversionError, EncoderOutput, EncoderRunner};

/// Bytes written to the output path on a simulated successful encode.
const DEFAULT_OUTPUT: &[u8] = b"mock encoded media";

/// How the next encoder run behaves.
#[derive(Debug, Clone)]
enum Behavior {
    /// Exit 0 and write `output` to the output path.
    Succeed { output: Vec<u8> },
    /// Exit 0 without writing anything.
    NoOutput,
    /// Exit nonzero with the given stderr.
    Fail { exit_code: i32, stderr: String },
}

/// Mock implementation of the EncoderRunner trait.
///
/// Provides controllable behavior for testing:
/// - Record every argument list for assertions
/// - Simulate success by writing placeholder bytes to the output path
///   (the last argument)
/// - Simulate nonzero exits and runs that produce nothing
///
/// # Example
///
/// ```rust,ignore
/// use mediaconv_core::testing::MockEncoderRunner;
///
/// let runner = Arc::new(MockEncoderRunner::new());
/// let converter = MediaConverter::new(&config, runner.clone());
///
/// converter.convert(request).await?;
///
/// let calls = runner.invocations().await;
/// assert!(calls[0].contains(&"libvpx-vp9".to_string()));
/// ```
#[derive(Debug)]
pub struct MockEncoderRunner {
    /// Recorded argument lists.
    invocations: Arc<RwLock<Vec<Vec<String>>>>,
    /// Behavior applied to every run.
    behavior: Arc<RwLock<Behavior>>,
}

impl Default for MockEncoderRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEncoderRunner {
    /// Create a new mock runner that succeeds.
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(RwLock::new(Vec::new())),
            behavior: Arc::new(RwLock::new(Behavior::Succeed {
                output: DEFAULT_OUTPUT.to_vec(),
            })),
        }
    }

    /// Get all recorded argument lists.
    pub async fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.read().await.clone()
    }

    /// Get the number of encoder runs.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Clear recorded invocations.
    pub async fn clear_recorded(&self) {
        self.invocations.write().await.clear();
    }

    /// Succeed and write `output` to the output path.
    pub async fn set_output_bytes(&self, output: Vec<u8>) {
        *self.behavior.write().await = Behavior::Succeed { output };
    }

    /// Exit nonzero with the given stderr.
    pub async fn set_failure(&self, exit_code: i32, stderr: impl Into<String>) {
        *self.behavior.write().await = Behavior::Fail {
            exit_code,
            stderr: stderr.into(),
        };
    }

    /// Exit 0 without producing an output file.
    pub async fn set_no_output(&self) {
        *self.behavior.write().await = Behavior::NoOutput;
    }
}

#[async_trait]
impl EncoderRunner for MockEncoderRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, args: &[String]) -> Result<EncoderOutput, ConversionError> {
        self.invocations.write().await.push(args.to_vec());

        let behavior = self.behavior.read().await.clone();
        match behavior {
            Behavior::Succeed { output } => {
                if let Some(path) = args.last() {
                    let path = Path::new(path);
                    tokio::fs::write(path, &output)
                        .await
                        .map_err(|e| ConversionError::from_io(e, path))?;
                }
                Ok(EncoderOutput {
                    exit_code: Some(0),
                    stderr: String::new(),
                })
            }
            Behavior::NoOutput => Ok(EncoderOutput {
                exit_code: Some(0),
                stderr: String::new(),
            }),
            Behavior::Fail { exit_code, stderr } => Ok(EncoderOutput {
                exit_code: Some(exit_code),
                stderr,
            }),
        }
    }

    async fn validate(&self) -> Result<(), ConversionError> {
        Ok(())
    }
}
