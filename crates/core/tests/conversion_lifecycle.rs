//! Full upload → convert → download lifecycle through the public API.

use std::sync::Arc;

use image::{ColorType, ImageFormat as Codec};
use tempfile::TempDir;

use mediaconv_core::{
    take_output, testing::fixtures, testing::MockEncoderRunner, Config, ConversionError,
    ConversionRequest, ConverterConfig, EncoderRunner, ImageFormat, MediaConverter, MediaKind,
    UploadedFile, FORMAT_PROFILES,
};

fn setup() -> (TempDir, Arc<MediaConverter>, Arc<MockEncoderRunner>) {
    let root = TempDir::new().unwrap();
    let config = Config {
        converter: ConverterConfig::default()
            .with_temp_dir(root.path().join("scratch"))
            .with_output_dir(root.path().join("output")),
        ..Default::default()
    };
    let runner = Arc::new(MockEncoderRunner::new());
    let converter = MediaConverter::new(&config, Arc::clone(&runner) as Arc<dyn EncoderRunner>);
    (root, Arc::new(converter), runner)
}

#[tokio::test]
async fn test_png_converts_to_every_image_format() {
    let (root, converter, _runner) = setup();

    for format in ImageFormat::ALL {
        let upload = UploadedFile::from_bytes("photo.png", fixtures::png_bytes(24, 16));
        let request =
            ConversionRequest::parse(Some(upload), MediaKind::Image, format.extension()).unwrap();

        let converted = converter.convert(request).await.unwrap();
        assert!(converted.size_bytes > 0);

        let taken = take_output(&converted.path).await.unwrap();
        assert!(taken.removed);
        assert_eq!(taken.file_name, format!("photo.{}", format.extension()));

        let img = image::load_from_memory_with_format(&taken.data, format.codec()).unwrap();
        assert_eq!((img.width(), img.height()), (24, 16));
    }

    let leftovers = std::fs::read_dir(root.path().join("output")).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_jpeg_output_is_always_rgb() {
    let (_root, converter, _runner) = setup();

    let rgba = image::DynamicImage::new_rgba8(8, 8);
    let luma = image::DynamicImage::new_luma8(8, 8);
    let inputs = [
        ("alpha.png", fixtures::encode(&rgba, Codec::Png)),
        ("gray.png", fixtures::encode(&luma, Codec::Png)),
        ("palette.gif", fixtures::gif_bytes(8, 8)),
    ];

    for (name, data) in inputs {
        let upload = UploadedFile::from_bytes(name, data);
        let request = ConversionRequest::parse(Some(upload), MediaKind::Image, "jpeg").unwrap();
        let converted = converter.convert(request).await.unwrap();

        let taken = take_output(&converted.path).await.unwrap();
        let img = image::load_from_memory_with_format(&taken.data, Codec::Jpeg).unwrap();
        assert_eq!(img.color(), ColorType::Rgb8, "input {}", name);
    }
}

#[tokio::test]
async fn test_same_image_converts_identically_twice() {
    let (_root, converter, _runner) = setup();
    let data = fixtures::png_bytes(20, 20);

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let upload = UploadedFile::from_bytes("photo.png", data.clone());
        let request = ConversionRequest::parse(Some(upload), MediaKind::Image, "png").unwrap();
        let converted = converter.convert(request).await.unwrap();
        let taken = take_output(&converted.path).await.unwrap();
        outputs.push(image::load_from_memory(&taken.data).unwrap().to_rgb8());
    }

    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn test_every_video_profile_reaches_encoder() {
    let (_root, converter, runner) = setup();

    for profile in FORMAT_PROFILES.iter() {
        let extension = profile.format.extension();
        let upload = UploadedFile::from_bytes("clip.mov", vec![3u8; 1024]);
        let request = ConversionRequest::parse(Some(upload), MediaKind::Video, extension).unwrap();

        let converted = converter.convert(request).await.unwrap();
        assert!(converted.size_bytes > 0);
        assert_eq!(converted.file_name(), format!("clip.{}", extension));
        take_output(&converted.path).await.unwrap();

        let invocations = runner.invocations().await;
        let args = invocations.last().unwrap();
        assert!(args.last().unwrap().ends_with(&format!(".{}", extension)));
        match profile.container {
            Some(container) => {
                let f = args.iter().position(|a| a == "-f").unwrap();
                assert_eq!(args[f + 1], container);
            }
            None => assert!(!args.iter().any(|a| a == "-f")),
        }
    }

    assert_eq!(runner.invocation_count().await, FORMAT_PROFILES.len());
}

#[tokio::test]
async fn test_oversized_video_is_rejected_before_encoding() {
    let (_root, converter, runner) = setup();

    let upload = UploadedFile::from_bytes("huge.mp4", vec![0u8; 50 * 1024 * 1024]);
    let request = ConversionRequest::parse(Some(upload), MediaKind::Video, "webm").unwrap();

    let err = converter.convert(request).await.unwrap_err();
    assert!(matches!(err, ConversionError::FileTooLarge { .. }));
    assert_eq!(err.kind(), "file_too_large");
    assert_eq!(runner.invocation_count().await, 0);
}
