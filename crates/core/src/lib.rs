pub mod config;
pub mod converter;
pub mod handoff;
pub mod metrics;
pub mod testing;
pub mod validator;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ServerConfig,
};
pub use converter::{
    is_accepted_upload, ConversionError, ConversionRequest, ConversionResult, ConvertedFile,
    ConverterConfig, EncoderOutput, EncoderRunner, FfmpegRunner, FormatProfile, ImageFormat,
    MediaConverter, MediaKind, OutputFormat, UploadedFile, ValidatedRequest, VideoFormat,
    ACCEPTED_UPLOAD_EXTENSIONS, FORMAT_PROFILES,
};
pub use handoff::{discard_output, take_output, TakenOutput};
pub use validator::{UploadLimits, ValidationError, Validator};
