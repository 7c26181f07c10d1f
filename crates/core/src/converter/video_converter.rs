//! Video conversion through the external encoder.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConversionError;
use super::files::{output_file_name, sanitize_filename, write_output};
use super::runner::EncoderRunner;
use super::types::{ConvertedFile, OutputFormat, UploadedFile, VideoFormat};
use crate::validator::Validator;

/// Converts videos by running the encoder inside a per-request workspace.
pub struct VideoConverter {
    config: ConverterConfig,
    validator: Validator,
    runner: Arc<dyn EncoderRunner>,
}

impl VideoConverter {
    pub fn new(config: ConverterConfig, validator: Validator, runner: Arc<dyn EncoderRunner>) -> Self {
        Self {
            config,
            validator,
            runner,
        }
    }

    pub fn runner(&self) -> &dyn EncoderRunner {
        self.runner.as_ref()
    }

    /// Builds encoder arguments for a conversion.
    ///
    /// Everything between input and output comes from the format's profile;
    /// formats without one are converted by container only.
    pub fn build_args(&self, input_path: &Path, output_path: &Path, format: VideoFormat) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
        ];

        if let Some(profile) = format.profile() {
            args.extend(profile.to_ffmpeg_args());
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(output_path.to_string_lossy().to_string());

        args
    }

    /// Converts an upload to `format`.
    ///
    /// The workspace directory is removed on every exit path; only the copy
    /// placed in the output directory survives.
    pub async fn convert<R>(
        &self,
        file: UploadedFile<R>,
        format: VideoFormat,
    ) -> Result<ConvertedFile, ConversionError>
    where
        R: Read + Seek + Send + 'static,
    {
        let start = Instant::now();
        let safe_name = sanitize_filename(file.name());
        let output_name = output_file_name(&safe_name, format.extension());

        let workspace = self.create_workspace().await?;
        // Separate directories so an mp4 -> mp4 conversion never reads and writes one path.
        let input_dir = workspace.path().join("in");
        let encoded_dir = workspace.path().join("out");
        for dir in [&input_dir, &encoded_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ConversionError::from_io(e, dir))?;
        }
        let input_path = input_dir.join(&safe_name);
        let encoded_path = encoded_dir.join(&output_name);

        let size = materialize(file, input_path.clone()).await?;
        self.validator.check_size(size)?;

        let args = self.build_args(&input_path, &encoded_path, format);
        debug!(
            workspace = %workspace.path().display(),
            runner = self.runner.name(),
            ?args,
            "Invoking encoder"
        );

        let output = self.runner.run(&args).await?;
        if !output.success() {
            return Err(ConversionError::EncodeFailed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        if tokio::fs::metadata(&encoded_path).await.is_err() {
            return Err(ConversionError::conversion_failed(
                "Encoder exited successfully but produced no output file",
            ));
        }

        let output_dir = self.config.output_dir.clone();
        let (path, size_bytes) = tokio::task::spawn_blocking(move || {
            write_output(&output_dir, &output_name, |dest| {
                let mut encoded = File::open(&encoded_path)?;
                io::copy(&mut encoded, dest).map(|_| ())
            })
        })
        .await
        .map_err(|e| ConversionError::conversion_failed(format!("Output copy task failed: {}", e)))??;

        drop(workspace);

        Ok(ConvertedFile {
            path,
            size_bytes,
            format: OutputFormat::Video(format),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn create_workspace(&self) -> Result<TempDir, ConversionError> {
        let root = &self.config.temp_dir;
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| ConversionError::from_io(e, root))?;

        tempfile::Builder::new()
            .prefix("mediaconv-")
            .tempdir_in(root)
            .map_err(|e| ConversionError::from_io(e, root))
    }
}

/// Streams the upload into `path`, returning the bytes written.
async fn materialize<R>(file: UploadedFile<R>, path: PathBuf) -> Result<u64, ConversionError>
where
    R: Read + Seek + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let (_, mut reader) = file.into_parts();
        reader
            .rewind()
            .map_err(|e| ConversionError::conversion_failed(format!("Failed to rewind upload: {}", e)))?;

        let mut dest = File::create(&path).map_err(|e| ConversionError::from_io(e, &path))?;
        io::copy(&mut reader, &mut dest).map_err(|e| ConversionError::from_io(e, &path))?;

        let size = dest
            .metadata()
            .map_err(|e| ConversionError::from_io(e, &path))?
            .len();
        Ok(size)
    })
    .await
    .map_err(|e| ConversionError::conversion_failed(format!("Upload copy task failed: {}", e)))?
}
