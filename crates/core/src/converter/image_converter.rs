//! In-process image conversion.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageReader};
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

use super::error::ConversionError;
use super::files::{output_file_name, sanitize_filename, write_output};
use super::types::{ConvertedFile, ImageFormat, OutputFormat, UploadedFile};

/// Largest side an ICO entry can have.
const ICO_MAX_SIDE: u32 = 256;

/// Converts images with the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageConverter {
    output_dir: PathBuf,
}

impl ImageConverter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Decodes the upload and re-encodes it into the output directory.
    ///
    /// Runs on the blocking pool; decoding and encoding are CPU-bound.
    pub async fn convert<R>(
        &self,
        file: UploadedFile<R>,
        format: ImageFormat,
    ) -> Result<ConvertedFile, ConversionError>
    where
        R: Read + Seek + Send + 'static,
    {
        let start = Instant::now();
        let output_dir = self.output_dir.clone();

        let (path, size_bytes) =
            tokio::task::spawn_blocking(move || convert_blocking(file, format, &output_dir))
                .await
                .map_err(|e| {
                    ConversionError::conversion_failed(format!("Image conversion task failed: {}", e))
                })??;

        Ok(ConvertedFile {
            path,
            size_bytes,
            format: OutputFormat::Image(format),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn convert_blocking<R: Read + Seek>(
    file: UploadedFile<R>,
    format: ImageFormat,
    output_dir: &Path,
) -> Result<(PathBuf, u64), ConversionError> {
    let (name, reader) = file.into_parts();
    let file_name = output_file_name(&sanitize_filename(&name), format.extension());

    let img = ImageReader::new(BufReader::new(reader))
        .with_guessed_format()
        .map_err(|e| ConversionError::conversion_failed(format!("Failed to read image: {}", e)))?
        .decode()
        .map_err(|e| ConversionError::conversion_failed(format!("Failed to decode image: {}", e)))?;

    debug!(
        source = %name,
        color = ?img.color(),
        width = img.width(),
        height = img.height(),
        target = format.extension(),
        "Decoded image"
    );

    let img = prepare_for(img, format);
    let encoded = encode(&img, format)?;

    write_output(output_dir, &file_name, |f| f.write_all(&encoded))
}

/// Adjusts pixel data to what the target encoder accepts.
///
/// JPEG has no alpha or palette, so anything but RGB8 becomes RGB8. The GIF,
/// WebP and BMP encoders get RGB8/RGBA8. ICO always gets RGBA8, capped at 256px.
fn prepare_for(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Jpeg => {
            if img.color() == ColorType::Rgb8 {
                img
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            }
        }
        ImageFormat::Png => img,
        // ICO entries are PNGs that decoders only accept as RGBA8.
        ImageFormat::Ico => {
            let img = DynamicImage::ImageRgba8(img.to_rgba8());
            let (width, height) = img.dimensions();
            if width > ICO_MAX_SIDE || height > ICO_MAX_SIDE {
                img.resize(ICO_MAX_SIDE, ICO_MAX_SIDE, FilterType::Lanczos3)
            } else {
                img
            }
        }
        ImageFormat::Gif | ImageFormat::Webp | ImageFormat::Bmp => to_rgb_family(img),
    }
}

fn to_rgb_family(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => img,
        color if color.has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

/// Encodes with the per-format quality policy.
fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ConversionError> {
    let mut buffer = Vec::new();
    let encode_error =
        |e: image::ImageError| ConversionError::conversion_failed(format!("Failed to encode image: {}", e));

    match format {
        ImageFormat::Jpeg => {
            let quality = format.quality().unwrap_or(95);
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            img.write_with_encoder(encoder).map_err(encode_error)?;
        }
        ImageFormat::Webp => {
            let quality = format.quality().unwrap_or(90) as f32;
            let (width, height) = img.dimensions();
            buffer = if img.color().has_alpha() {
                let rgba = img.to_rgba8();
                webp::Encoder::from_rgba(&rgba, width, height)
                    .encode(quality)
                    .to_vec()
            } else {
                let rgb = img.to_rgb8();
                webp::Encoder::from_rgb(&rgb, width, height)
                    .encode(quality)
                    .to_vec()
            };
        }
        _ => {
            img.write_to(&mut Cursor::new(&mut buffer), format.codec())
                .map_err(encode_error)?;
        }
    }

    Ok(buffer)
}
