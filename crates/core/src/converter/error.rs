//! Error types for the converter module.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::MediaKind;
use crate::validator::ValidationError;

/// Errors that can end a conversion request.
///
/// Every variant is terminal for the request; nothing is retried.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// No file was supplied, or it holds no bytes.
    #[error("No input file provided")]
    EmptyInput,

    /// Upload exceeds the size limit.
    #[error("File size of {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// Image exceeds the dimension limit.
    #[error("Image dimensions {width}x{height} exceed {max}x{max} pixels")]
    DimensionTooLarge { width: u32, height: u32, max: u32 },

    /// Image format could not be identified or its header decoded.
    #[error("Unable to identify image file: {reason}")]
    UnreadableImage { reason: String },

    /// Requested format is not offered for the media kind.
    #[error("Unsupported {kind} output format: {format}")]
    UnsupportedFormat { kind: MediaKind, format: String },

    /// Write refused by the filesystem.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Encoder exited with a nonzero status.
    #[error("Encoder failed: {stderr}")]
    EncodeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Encoder did not finish in time and was killed.
    #[error("Encoder timed out after {timeout_secs} seconds")]
    EncoderTimeout { timeout_secs: u64 },

    /// Any other decode, encode or I/O failure.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String },
}

impl ConversionError {
    /// Creates a new conversion failed error.
    pub fn conversion_failed(reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new unsupported format error.
    pub fn unsupported_format(kind: MediaKind, format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            kind,
            format: format.into(),
        }
    }

    /// Maps an I/O error on `path`, singling out permission failures.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::conversion_failed(format!("{}: {}", path.display(), err))
        }
    }

    /// Stable snake_case code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::DimensionTooLarge { .. } => "dimension_too_large",
            Self::UnreadableImage { .. } => "unreadable_image",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::EncodeFailed { .. } => "encode_failed",
            Self::EncoderTimeout { .. } => "encoder_timeout",
            Self::ConversionFailed { .. } => "conversion_failed",
        }
    }

    /// Whether the request itself was at fault rather than the converter.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::FileTooLarge { .. }
                | Self::DimensionTooLarge { .. }
                | Self::UnreadableImage { .. }
                | Self::UnsupportedFormat { .. }
        )
    }
}

impl From<ValidationError> for ConversionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyInput => Self::EmptyInput,
            ValidationError::FileTooLarge { size, limit } => Self::FileTooLarge { size, limit },
            ValidationError::UnreadableImage { reason } => Self::UnreadableImage { reason },
            ValidationError::DimensionTooLarge { width, height, max } => {
                Self::DimensionTooLarge { width, height, max }
            }
            ValidationError::Io(e) => Self::conversion_failed(e.to_string()),
        }
    }
}
