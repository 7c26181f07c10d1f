//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::ConversionError;

/// Upload extensions offered by the upload form.
///
/// Advisory only: the converter never rejects a file because of its extension.
pub const ACCEPTED_UPLOAD_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "ico", "webp", "mp4", "avi", "mov", "mkv", "webm", "flv", "wmv",
    "m4v", "gif",
];

/// Whether a filename carries one of the [`ACCEPTED_UPLOAD_EXTENSIONS`].
pub fn is_accepted_upload(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_ascii_lowercase();
            ACCEPTED_UPLOAD_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Kind of media carried by an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

/// Image output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Ico,
}

impl ImageFormat {
    /// All image output formats, in the order they are offered.
    pub const ALL: [ImageFormat; 6] = [
        Self::Png,
        Self::Jpeg,
        Self::Gif,
        Self::Webp,
        Self::Bmp,
        Self::Ico,
    ];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Bmp => "bmp",
            Self::Ico => "ico",
        }
    }

    /// Encoder quality applied for this format, if any.
    pub fn quality(&self) -> Option<u8> {
        match self {
            Self::Jpeg => Some(95),
            Self::Webp => Some(90),
            _ => None,
        }
    }

    /// The matching `image` crate format.
    pub fn codec(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Gif => image::ImageFormat::Gif,
            Self::Webp => image::ImageFormat::WebP,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Ico => image::ImageFormat::Ico,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            "ico" => Ok(Self::Ico),
            _ => Err(ConversionError::unsupported_format(MediaKind::Image, s)),
        }
    }
}

/// Video output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Avi,
    Gif,
    Mkv,
    Webm,
    Flv,
    Wmv,
    M4v,
}

impl VideoFormat {
    /// All video output formats, in the order they are offered.
    pub const ALL: [VideoFormat; 8] = [
        Self::Mp4,
        Self::Avi,
        Self::Gif,
        Self::Mkv,
        Self::Webm,
        Self::Flv,
        Self::Wmv,
        Self::M4v,
    ];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Gif => "gif",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
            Self::Flv => "flv",
            Self::Wmv => "wmv",
            Self::M4v => "m4v",
        }
    }
}

impl FromStr for VideoFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "avi" => Ok(Self::Avi),
            "gif" => Ok(Self::Gif),
            "mkv" => Ok(Self::Mkv),
            "webm" => Ok(Self::Webm),
            "flv" => Ok(Self::Flv),
            "wmv" => Ok(Self::Wmv),
            "m4v" => Ok(Self::M4v),
            _ => Err(ConversionError::unsupported_format(MediaKind::Video, s)),
        }
    }
}

/// Requested output format, tied to the media kind it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Image(ImageFormat),
    Video(VideoFormat),
}

impl OutputFormat {
    /// Parses a format string within the allowed set for `kind`.
    pub fn parse(kind: MediaKind, s: &str) -> Result<Self, ConversionError> {
        match kind {
            MediaKind::Image => s.parse().map(Self::Image),
            MediaKind::Video => s.parse().map(Self::Video),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Image(_) => MediaKind::Image,
            Self::Video(_) => MediaKind::Video,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image(f) => f.extension(),
            Self::Video(f) => f.extension(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An uploaded file: a named, seekable byte stream.
#[derive(Debug)]
pub struct UploadedFile<R> {
    name: String,
    reader: R,
}

impl<R> UploadedFile<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }

    /// The filename declared by the uploader.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_parts(self) -> (String, R) {
        (self.name, self.reader)
    }
}

impl UploadedFile<Cursor<Vec<u8>>> {
    /// Wraps an in-memory upload.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Cursor::new(data.into()))
    }
}

impl UploadedFile<File> {
    /// Opens a file on disk as an upload named after its final path component.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, File::open(path)?))
    }
}

/// A single conversion request, created per interaction and consumed once.
#[derive(Debug)]
pub struct ConversionRequest<R> {
    /// The upload, if one was supplied.
    pub file: Option<UploadedFile<R>>,
    /// Target format; its variant carries the media kind.
    pub format: OutputFormat,
}

impl<R> ConversionRequest<R> {
    pub fn new(file: Option<UploadedFile<R>>, format: OutputFormat) -> Self {
        Self { file, format }
    }

    /// Builds a request from a declared media kind and a format string.
    ///
    /// Fails with [`ConversionError::UnsupportedFormat`] when the format does
    /// not belong to the kind's allowed set.
    pub fn parse(
        file: Option<UploadedFile<R>>,
        kind: MediaKind,
        format: &str,
    ) -> Result<Self, ConversionError> {
        Ok(Self::new(file, OutputFormat::parse(kind, format)?))
    }

    pub fn kind(&self) -> MediaKind {
        self.format.kind()
    }
}

/// A request that passed validation. The stream is rewound to its start.
#[derive(Debug)]
pub struct ValidatedRequest<R> {
    pub file: UploadedFile<R>,
    pub format: OutputFormat,
    /// Byte length measured during validation.
    pub size_bytes: u64,
    /// Pixel dimensions, for image requests.
    pub dimensions: Option<(u32, u32)>,
}

/// A successfully converted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    /// Stable output path, outside any temporary workspace.
    pub path: PathBuf,
    /// Output file size in bytes.
    pub size_bytes: u64,
    /// Format the file was encoded to.
    pub format: OutputFormat,
    /// Conversion duration in milliseconds.
    pub duration_ms: u64,
}

impl ConvertedFile {
    /// Output filename, without directories.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outcome of one conversion.
pub type ConversionResult = Result<ConvertedFile, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_parse_is_case_insensitive() {
        assert_eq!("WebP".parse::<ImageFormat>().unwrap(), ImageFormat::Webp);
        assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("jpg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!(" png ".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_image_format_extension_is_lowercase_name() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
        assert_eq!(ImageFormat::Webp.extension(), "webp");
        assert_eq!(ImageFormat::Ico.extension(), "ico");
    }

    #[test]
    fn test_image_quality_policy() {
        assert_eq!(ImageFormat::Jpeg.quality(), Some(95));
        assert_eq!(ImageFormat::Webp.quality(), Some(90));
        assert_eq!(ImageFormat::Png.quality(), None);
        assert_eq!(ImageFormat::Bmp.quality(), None);
    }

    #[test]
    fn test_output_format_must_match_kind() {
        let err = OutputFormat::parse(MediaKind::Image, "webm").unwrap_err();
        assert!(matches!(
            err,
            ConversionError::UnsupportedFormat {
                kind: MediaKind::Image,
                ..
            }
        ));

        let err = OutputFormat::parse(MediaKind::Video, "png").unwrap_err();
        assert_eq!(err.kind(), "unsupported_format");
    }

    #[test]
    fn test_gif_belongs_to_both_kinds() {
        assert_eq!(
            OutputFormat::parse(MediaKind::Image, "GIF").unwrap(),
            OutputFormat::Image(ImageFormat::Gif)
        );
        assert_eq!(
            OutputFormat::parse(MediaKind::Video, "GIF").unwrap(),
            OutputFormat::Video(VideoFormat::Gif)
        );
    }

    #[test]
    fn test_request_kind_follows_format() {
        let request = ConversionRequest::parse(
            Some(UploadedFile::from_bytes("clip.mov", vec![1, 2, 3])),
            MediaKind::Video,
            "MKV",
        )
        .unwrap();
        assert_eq!(request.kind(), MediaKind::Video);
        assert_eq!(request.format, OutputFormat::Video(VideoFormat::Mkv));
    }

    #[test]
    fn test_accepted_upload_extensions() {
        assert!(is_accepted_upload("photo.JPG"));
        assert!(is_accepted_upload("clip.mov"));
        assert!(!is_accepted_upload("notes.txt"));
        assert!(!is_accepted_upload("no_extension"));
    }

    #[test]
    fn test_media_kind_from_str() {
        assert_eq!("Image".parse::<MediaKind>().unwrap(), MediaKind::Image);
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert!("audio".parse::<MediaKind>().is_err());
    }
}
