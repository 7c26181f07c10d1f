//! Error types for the validator module.

use thiserror::Error;

/// Reasons an upload is rejected before conversion.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No input file provided")]
    EmptyInput,

    #[error("File size of {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Unable to identify image file: {reason}")]
    UnreadableImage { reason: String },

    #[error("Image dimensions {width}x{height} exceed {max}x{max} pixels")]
    DimensionTooLarge { width: u32, height: u32, max: u32 },

    /// Seeking or reading the stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ValidationError {
    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self::UnreadableImage {
            reason: reason.into(),
        }
    }
}
