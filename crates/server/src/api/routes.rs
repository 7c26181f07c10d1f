use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{convert, handlers, middleware::metrics_middleware};
use crate::state::AppState;

/// Room left above the upload limit for multipart framing and text fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Largest request body accepted by the API routes.
///
/// Uploads between the conversion limit and this bound reach the validator;
/// anything larger is cut off while the multipart form is read.
pub fn body_limit(max_upload_bytes: u64) -> usize {
    usize::try_from(max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = body_limit(state.config().limits.max_upload_bytes);

    // API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/formats", get(handlers::list_formats))
        .route("/convert", post(convert::convert))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
