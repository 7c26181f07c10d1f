//! Converter module for re-encoding uploaded media.
//!
//! Two variants sit behind [`MediaConverter`]:
//!
//! - [`ImageConverter`] decodes and re-encodes in process with the `image` crate
//!   (JPEG at quality 95, WebP at quality 90, encoder defaults otherwise).
//! - [`VideoConverter`] materializes the upload into a scoped workspace and runs
//!   ffmpeg with parameters from the static [`FormatProfile`] table.
//!
//! # Example
//!
//! ```ignore
//! use mediaconv_core::converter::{ConversionRequest, MediaConverter, MediaKind, UploadedFile};
//!
//! let converter = MediaConverter::with_ffmpeg(&config);
//!
//! let upload = UploadedFile::open("/path/to/clip.mov")?;
//! let request = ConversionRequest::parse(Some(upload), MediaKind::Video, "webm")?;
//!
//! let converted = converter.convert(request).await?;
//! println!("Wrote {} bytes to {:?}", converted.size_bytes, converted.path);
//! ```

mod config;
mod error;
mod files;
mod image_converter;
mod profile;
mod runner;
mod types;
mod video_converter;

pub use config::ConverterConfig;
pub use error::ConversionError;
pub use files::{in_request_dir, output_file_name, sanitize_filename, write_output};
pub use image_converter::ImageConverter;
pub use profile::{FormatProfile, VideoCodec, FORMAT_PROFILES};
pub use runner::{EncoderOutput, EncoderRunner, FfmpegRunner};
pub use types::{
    is_accepted_upload, ConversionRequest, ConversionResult, ConvertedFile, ImageFormat,
    MediaKind, OutputFormat, UploadedFile, ValidatedRequest, VideoFormat,
    ACCEPTED_UPLOAD_EXTENSIONS,
};
pub use video_converter::VideoConverter;

use std::io::{Read, Seek};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::metrics::{CONVERSIONS_TOTAL, CONVERSION_DURATION};
use crate::validator::Validator;

/// Validates requests and dispatches them to the image or video variant.
pub struct MediaConverter {
    validator: Validator,
    image: ImageConverter,
    video: VideoConverter,
}

impl MediaConverter {
    /// Creates a converter running the encoder through `runner`.
    pub fn new(config: &Config, runner: Arc<dyn EncoderRunner>) -> Self {
        let validator = Validator::new(config.limits);
        Self {
            validator,
            image: ImageConverter::new(config.converter.output_dir.clone()),
            video: VideoConverter::new(config.converter.clone(), validator, runner),
        }
    }

    /// Creates a converter that runs the configured ffmpeg binary.
    pub fn with_ffmpeg(config: &Config) -> Self {
        let runner = FfmpegRunner::from_config(&config.converter);
        Self::new(config, Arc::new(runner))
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn encoder(&self) -> &dyn EncoderRunner {
        self.video.runner()
    }

    /// Validates and converts a request.
    pub async fn convert<R>(&self, request: ConversionRequest<R>) -> ConversionResult
    where
        R: Read + Seek + Send + 'static,
    {
        let format = request.format;
        let result = match self.validator.validate(request) {
            Ok(validated) => self.dispatch(validated).await,
            Err(e) => Err(e.into()),
        };
        record(format, &result);
        result
    }

    /// Converts a request that already passed validation.
    pub async fn convert_validated<R>(&self, validated: ValidatedRequest<R>) -> ConversionResult
    where
        R: Read + Seek + Send + 'static,
    {
        let format = validated.format;
        let result = self.dispatch(validated).await;
        record(format, &result);
        result
    }

    async fn dispatch<R>(&self, validated: ValidatedRequest<R>) -> ConversionResult
    where
        R: Read + Seek + Send + 'static,
    {
        match validated.format {
            OutputFormat::Image(format) => self.image.convert(validated.file, format).await,
            OutputFormat::Video(format) => self.video.convert(validated.file, format).await,
        }
    }
}

fn record(format: OutputFormat, result: &ConversionResult) {
    let kind = format.kind().as_str();
    let outcome = match result {
        Ok(converted) => {
            info!(
                kind,
                format = format.extension(),
                path = %converted.path.display(),
                size_bytes = converted.size_bytes,
                duration_ms = converted.duration_ms,
                "Conversion completed"
            );
            CONVERSION_DURATION
                .with_label_values(&[kind])
                .observe(converted.duration_ms as f64 / 1000.0);
            "success"
        }
        Err(e) => e.kind(),
    };
    CONVERSIONS_TOTAL
        .with_label_values(&[kind, format.extension(), outcome])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockEncoderRunner};
    use crate::validator::UploadLimits;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn setup(limits: UploadLimits) -> (TempDir, Arc<MockEncoderRunner>, MediaConverter) {
        let root = TempDir::new().unwrap();
        let mut config = Config::default();
        config.limits = limits;
        config.converter = ConverterConfig::default()
            .with_temp_dir(root.path().join("tmp"))
            .with_output_dir(root.path().join("out"));

        let runner = Arc::new(MockEncoderRunner::new());
        let converter = MediaConverter::new(&config, Arc::clone(&runner) as Arc<dyn EncoderRunner>);
        (root, runner, converter)
    }

    fn request(
        name: &str,
        data: Vec<u8>,
        kind: MediaKind,
        format: &str,
    ) -> ConversionRequest<Cursor<Vec<u8>>> {
        ConversionRequest::parse(Some(UploadedFile::from_bytes(name, data)), kind, format).unwrap()
    }

    #[tokio::test]
    async fn test_image_request_is_converted_in_process() {
        let (root, runner, converter) = setup(UploadLimits::default());

        let result = converter
            .convert(request("photo.png", fixtures::png_bytes(10, 10), MediaKind::Image, "JPEG"))
            .await
            .unwrap();

        assert_eq!(result.file_name(), "photo.jpeg");
        assert!(result.path.starts_with(root.path().join("out")));
        assert_eq!(runner.invocation_count().await, 0);
    }

    #[tokio::test]
    async fn test_video_request_goes_through_encoder() {
        let (root, runner, converter) = setup(UploadLimits::default());

        let result = converter
            .convert(request("clip.mp4", vec![1u8; 512], MediaKind::Video, "WEBM"))
            .await
            .unwrap();

        assert_eq!(result.file_name(), "clip.webm");
        assert!(result.path.starts_with(root.path().join("out")));
        assert_eq!(runner.invocation_count().await, 1);
    }

    #[tokio::test]
    async fn test_fifty_mib_video_never_reaches_encoder() {
        let (_root, runner, converter) = setup(UploadLimits::default());

        let err = converter
            .convert(request(
                "huge.mp4",
                vec![0u8; 50 * 1024 * 1024],
                MediaKind::Video,
                "mp4",
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ConversionError::FileTooLarge { .. }));
        assert_eq!(runner.invocation_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let (_root, runner, converter) = setup(UploadLimits::default());

        let err = converter
            .convert(request("empty.mp4", Vec::new(), MediaKind::Video, "mkv"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConversionError::EmptyInput));
        assert_eq!(runner.invocation_count().await, 0);
    }

    #[tokio::test]
    async fn test_validation_errors_surface_from_convert() {
        let (_root, _runner, converter) = setup(UploadLimits::default());

        let err = converter
            .convert(request(
                "strip.png",
                fixtures::png_bytes(10_001, 1),
                MediaKind::Image,
                "png",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::DimensionTooLarge { .. }));

        let err = converter
            .convert(request(
                "broken.jpg",
                fixtures::corrupt_jpeg_bytes(),
                MediaKind::Image,
                "png",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnreadableImage { .. }));
    }

    #[tokio::test]
    async fn test_convert_validated_skips_revalidation() {
        let (_root, _runner, converter) = setup(UploadLimits::default());
        let validated = converter
            .validator()
            .validate(request("photo.png", fixtures::png_bytes(6, 6), MediaKind::Image, "bmp"))
            .unwrap();

        let result = converter.convert_validated(validated).await.unwrap();
        assert_eq!(result.file_name(), "photo.bmp");
    }
}
