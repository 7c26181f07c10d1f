use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use mediaconv_core::{Config, ImageFormat, VideoFormat, ACCEPTED_UPLOAD_EXTENSIONS};

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

/// Target formats per media kind, plus the upload extensions a client may offer.
#[derive(Serialize)]
pub struct FormatsResponse {
    pub image: Vec<&'static str>,
    pub video: Vec<&'static str>,
    pub accepted_extensions: Vec<&'static str>,
}

pub async fn list_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        image: ImageFormat::ALL.iter().map(|f| f.extension()).collect(),
        video: VideoFormat::ALL.iter().map(|f| f.extension()).collect(),
        accepted_extensions: ACCEPTED_UPLOAD_EXTENSIONS.to_vec(),
    })
}

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
