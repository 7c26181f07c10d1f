//! Upload validation, run before any conversion work.
//!
//! Checks happen in a fixed order and stop at the first failure:
//!
//! 1. a file was supplied and is not empty
//! 2. its size is within [`UploadLimits::max_upload_bytes`]
//! 3. (images) the format can be identified and the header decoded
//! 4. (images) neither dimension exceeds [`UploadLimits::max_image_dimension`]
//!
//! The stream position is restored to the start before returning.

mod error;

pub use error::ValidationError;

use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::converter::{ConversionRequest, MediaKind, ValidatedRequest};

/// 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum width or height of an image, in pixels.
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 10_000;

/// Size and dimension bounds applied to uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_max_image_dimension() -> u32 {
    DEFAULT_MAX_IMAGE_DIMENSION
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            max_image_dimension: default_max_image_dimension(),
        }
    }
}

/// Gate in front of the converters. Stateless apart from its limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    limits: UploadLimits,
}

impl Validator {
    pub fn new(limits: UploadLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Validates a request, handing back the rewound upload on success.
    pub fn validate<R: Read + Seek>(
        &self,
        request: ConversionRequest<R>,
    ) -> Result<ValidatedRequest<R>, ValidationError> {
        let ConversionRequest { file, format } = request;
        let mut file = file.ok_or(ValidationError::EmptyInput)?;

        let size_bytes = stream_len(file.reader_mut())?;
        if size_bytes == 0 {
            return Err(ValidationError::EmptyInput);
        }
        self.check_size(size_bytes)?;

        let dimensions = match format.kind() {
            MediaKind::Image => {
                let (width, height) = read_dimensions(file.reader_mut())?;
                self.check_dimensions(width, height)?;
                Some((width, height))
            }
            MediaKind::Video => None,
        };

        Ok(ValidatedRequest {
            file,
            format,
            size_bytes,
            dimensions,
        })
    }

    /// Fails with [`ValidationError::FileTooLarge`] above the size limit.
    pub fn check_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.limits.max_upload_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                limit: self.limits.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Fails with [`ValidationError::DimensionTooLarge`] when either side is over the limit.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), ValidationError> {
        let max = self.limits.max_image_dimension;
        if width > max || height > max {
            return Err(ValidationError::DimensionTooLarge { width, height, max });
        }
        Ok(())
    }
}

/// Total byte length of a stream; leaves the position at the start.
fn stream_len<S: Seek>(stream: &mut S) -> Result<u64, ValidationError> {
    let len = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(0))?;
    Ok(len)
}

/// Identifies the image format and reads its dimensions from the header.
fn read_dimensions<R: Read + Seek>(reader: &mut R) -> Result<(u32, u32), ValidationError> {
    let result = {
        let image_reader = ImageReader::new(BufReader::new(&mut *reader)).with_guessed_format()?;
        if image_reader.format().is_none() {
            Err(ValidationError::unreadable("unrecognized image format"))
        } else {
            image_reader
                .into_dimensions()
                .map_err(|e| ValidationError::unreadable(e.to_string()))
        }
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}
