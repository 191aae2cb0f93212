//! voxcast HTTP server library logic.

pub mod api;
pub mod api_tts;
pub mod api_video;
pub mod config;
pub mod context;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Extension, Json, Router,
};
use context::WorkerContext;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use voxcast_video::JobDispatcher;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Engines, GPU gate and speech limits, built once at startup.
    pub context: Arc<WorkerContext>,
    /// Video job queue; also owns the job store.
    pub jobs: JobDispatcher,
    /// Largest accepted video upload.
    pub max_upload_bytes: usize,
    /// Allowed CORS origins. Empty allows any.
    pub cors_origins: Vec<String>,
}

/// Maximum request body size outside the video upload routes (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "voxcast",
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let upload_routes = Router::new()
        .route(
            "/video-translate",
            post(api_video::translate_video_handler),
        )
        .route(
            "/video-translate/async",
            post(api_video::submit_video_handler),
        )
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/tts",
            post(api_tts::tts_handler).layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES)),
        )
        .route("/jobs/{job_id}", get(api_video::get_job_handler))
        .route(
            "/jobs/{job_id}/output",
            get(api_video::get_job_output_handler),
        )
        .merge(upload_routes);

    let cors = cors_layer(&state.cors_origins);

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
