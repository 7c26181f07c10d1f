//! Testing utilities and mock implementations.
//!
//! This module provides a mock encoder runner so video conversion can be
//! exercised without an ffmpeg binary, plus fixtures for building image
//! uploads in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediaconv_core::testing::{fixtures, MockEncoderRunner};
//!
//! let runner = Arc::new(MockEncoderRunner::new());
//! runner.set_failure(1, "Unknown encoder").await;
//!
//! let upload = UploadedFile::from_bytes("photo.png", fixtures::png_bytes(64, 64));
//! ```

mod mock_runner;

pub use mock_runner::MockEncoderRunner;

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Encode an image in memory.
    pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format)
            .expect("fixture image should encode");
        buffer
    }

    /// A gradient RGB image of the given size.
    pub fn rgb_image(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// PNG bytes of a gradient image.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encode(&rgb_image(width, height), ImageFormat::Png)
    }

    /// GIF bytes (palette-based) of a small two-color image.
    pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        encode(&DynamicImage::ImageRgba8(img), ImageFormat::Gif)
    }

    /// Bytes that start like a JPEG but cannot be decoded.
    pub fn corrupt_jpeg_bytes() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
        data.extend_from_slice(b"this is not entropy-coded image data");
        data
    }
}
