use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upload limits are non-zero
/// - Encoder timeout is non-zero and an ffmpeg path is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Limits validation
    if config.limits.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "limits.max_upload_bytes cannot be 0".to_string(),
        ));
    }
    if config.limits.max_image_dimension == 0 {
        return Err(ConfigError::ValidationError(
            "limits.max_image_dimension cannot be 0".to_string(),
        ));
    }

    // Converter validation
    if config.converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.converter.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
