//! Upload, convert and download in a single request.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use mediaconv_core::{
    discard_output, is_accepted_upload, take_output, ConversionError, ConversionRequest,
    MediaKind, UploadedFile,
};

use super::routes::body_limit;
use crate::state::AppState;

/// Header carrying the size of the converted file in bytes.
pub const OUTPUT_SIZE_HEADER: &str = "x-output-size";

/// Error code for requests the converter never sees.
const INVALID_REQUEST: &str = "invalid_request";

/// Error body returned for every failed conversion.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// Failure of the convert endpoint.
#[derive(Debug)]
pub enum ConvertError {
    /// The multipart form itself was malformed or incomplete.
    InvalidRequest(String),
    /// The converter rejected or failed the request.
    Conversion(ConversionError),
}

impl From<ConversionError> for ConvertError {
    fn from(err: ConversionError) -> Self {
        Self::Conversion(err)
    }
}

/// HTTP status for a conversion error.
pub fn status_for(err: &ConversionError) -> StatusCode {
    match err {
        ConversionError::EmptyInput
        | ConversionError::UnsupportedFormat { .. }
        | ConversionError::UnreadableImage { .. } => StatusCode::BAD_REQUEST,
        ConversionError::FileTooLarge { .. } | ConversionError::DimensionTooLarge { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        ConversionError::EncoderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ConversionError::PermissionDenied { .. }
        | ConversionError::EncodeFailed { .. }
        | ConversionError::ConversionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ConvertError::InvalidRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error,
                    kind: INVALID_REQUEST.to_string(),
                },
            ),
            ConvertError::Conversion(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    warn!(kind = err.kind(), "Conversion failed: {}", err);
                }
                (
                    status,
                    ErrorResponse {
                        error: err.to_string(),
                        kind: err.kind().to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Fields collected from the multipart form.
#[derive(Default)]
struct ConvertForm {
    kind: Option<String>,
    format: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

/// Size and limit of a request whose body was cut off while reading the form.
#[derive(Debug, Clone, Copy)]
struct BodyBounds {
    content_length: Option<u64>,
    max_upload_bytes: u64,
}

impl BodyBounds {
    fn from_headers(headers: &HeaderMap, max_upload_bytes: u64) -> Self {
        let content_length = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        Self {
            content_length,
            max_upload_bytes,
        }
    }

    /// Maps a multipart failure to an error, reporting a truncated body as FileTooLarge.
    fn form_error(&self, context: &str, err: MultipartError) -> ConvertError {
        if err.status() != StatusCode::PAYLOAD_TOO_LARGE {
            return ConvertError::InvalidRequest(format!("{}: {}", context, err));
        }
        let cutoff = body_limit(self.max_upload_bytes) as u64;
        ConvertError::Conversion(ConversionError::FileTooLarge {
            size: self
                .content_length
                .unwrap_or_else(|| cutoff.saturating_add(1)),
            limit: self.max_upload_bytes,
        })
    }
}

async fn read_form(
    mut multipart: Multipart,
    bounds: BodyBounds,
) -> Result<ConvertForm, ConvertError> {
    let mut form = ConvertForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bounds.form_error("Failed to read multipart form", e)),
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bounds.form_error("Failed to read file", e))?;
                form.file = Some((file_name, data.to_vec()));
            }
            "kind" | "format" => {
                let text = field.text().await.map_err(|e| {
                    bounds.form_error(&format!("Failed to read field '{}'", name), e)
                })?;
                if name == "kind" {
                    form.kind = Some(text);
                } else {
                    form.format = Some(text);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Converts the uploaded file and streams the result back as an attachment.
///
/// The converted file is deleted from disk once it has been read.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ConvertError> {
    let bounds = BodyBounds::from_headers(&headers, state.config().limits.max_upload_bytes);
    let form = read_form(multipart, bounds).await?;

    let kind = form
        .kind
        .ok_or_else(|| ConvertError::InvalidRequest("Missing 'kind' field".to_string()))?;
    let kind = MediaKind::from_str(kind.trim()).map_err(ConvertError::InvalidRequest)?;
    let format = form
        .format
        .ok_or_else(|| ConvertError::InvalidRequest("Missing 'format' field".to_string()))?;

    // An empty file part counts as no file at all.
    let upload = form
        .file
        .filter(|(_, data)| !data.is_empty())
        .map(|(name, data)| UploadedFile::from_bytes(name, data));

    if let Some(upload) = &upload {
        if !is_accepted_upload(upload.name()) {
            debug!(file = upload.name(), "Upload extension is not in the accepted list");
        }
    }

    let request = ConversionRequest::parse(upload, kind, format.trim())?;
    let converted = state.converter().convert(request).await?;
    let taken = match take_output(&converted.path).await {
        Ok(taken) => taken,
        Err(e) => {
            discard_output(&converted.path).await;
            return Err(e.into());
        }
    };

    info!(
        file = %taken.file_name,
        size_bytes = taken.data.len(),
        removed = taken.removed,
        "Serving converted file"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        taken.file_name.replace(['"', '\\'], "_")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::HeaderName::from_static(OUTPUT_SIZE_HEADER),
                HeaderValue::from(taken.data.len()),
            ),
        ],
        taken.data,
    )
        .into_response())
}
