//! Static encode parameters per video output format.

use super::types::VideoFormat;

/// Video codec selected by a format profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// H.264 / AVC
    H264,
    /// VP9
    Vp9,
    /// GIF
    Gif,
    /// Sorenson Spark (FLV1)
    Flv,
    /// Windows Media Video 8
    Wmv2,
}

impl VideoCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::Vp9 => "libvpx-vp9",
            Self::Gif => "gif",
            Self::Flv => "flv",
            Self::Wmv2 => "wmv2",
        }
    }
}

/// Fixed encode parameters for one video output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    pub format: VideoFormat,
    pub codec: VideoCodec,
    /// Constant Rate Factor (lower = better).
    pub crf: Option<u8>,
    /// Encoder speed/quality preset.
    pub preset: Option<&'static str>,
    /// Muxer forced with `-f`, when the extension alone is not enough.
    pub container: Option<&'static str>,
}

/// The profile table. Formats absent here are converted by container only.
pub static FORMAT_PROFILES: [FormatProfile; 7] = [
    FormatProfile {
        format: VideoFormat::Mp4,
        codec: VideoCodec::H264,
        crf: Some(18),
        preset: Some("slow"),
        container: None,
    },
    FormatProfile {
        format: VideoFormat::M4v,
        codec: VideoCodec::H264,
        crf: Some(18),
        preset: Some("slow"),
        container: Some("mp4"),
    },
    FormatProfile {
        format: VideoFormat::Mkv,
        codec: VideoCodec::H264,
        crf: Some(18),
        preset: Some("slow"),
        container: Some("matroska"),
    },
    FormatProfile {
        format: VideoFormat::Webm,
        codec: VideoCodec::Vp9,
        crf: Some(30),
        preset: None,
        container: None,
    },
    FormatProfile {
        format: VideoFormat::Gif,
        codec: VideoCodec::Gif,
        crf: None,
        preset: None,
        container: None,
    },
    FormatProfile {
        format: VideoFormat::Flv,
        codec: VideoCodec::Flv,
        crf: None,
        preset: None,
        container: None,
    },
    FormatProfile {
        format: VideoFormat::Wmv,
        codec: VideoCodec::Wmv2,
        crf: None,
        preset: None,
        container: None,
    },
];

impl FormatProfile {
    /// Looks up the profile for a format.
    pub fn lookup(format: VideoFormat) -> Option<&'static FormatProfile> {
        FORMAT_PROFILES.iter().find(|p| p.format == format)
    }

    /// Encoder arguments for this profile, placed between input and output.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.codec.ffmpeg_codec().to_string()];

        if let Some(preset) = self.preset {
            args.extend(["-preset".to_string(), preset.to_string()]);
        }
        if let Some(crf) = self.crf {
            args.extend(["-crf".to_string(), crf.to_string()]);
        }
        if let Some(container) = self.container {
            args.extend(["-f".to_string(), container.to_string()]);
        }

        args
    }
}

impl VideoFormat {
    /// Encode parameters for this format, if it has any.
    pub fn profile(&self) -> Option<&'static FormatProfile> {
        FormatProfile::lookup(*self)
    }
}
