//! Error responses shared by every handler.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use voxcast_speech::SpeechError;
use voxcast_video::VideoError;

/// Seconds a client is asked to wait after a 503.
pub const RETRY_AFTER_SECS: u64 = 30;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("timed out: {0}")]
    GatewayTimeout(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::InternalServerError(msg) => msg,
        }
    }

    fn finish(&self, mut response: Response) -> Response {
        *response.status_mut() = self.status();
        if matches!(self, ApiError::ServiceUnavailable(_)) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message()
        }));
        self.finish(body.into_response())
    }
}

/// Renders an [`ApiError`] as a `text/plain` body instead of JSON.
#[derive(Debug)]
pub struct PlainText(pub ApiError);

impl IntoResponse for PlainText {
    fn into_response(self) -> Response {
        let response = self.0.message().to_string().into_response();
        self.0.finish(response)
    }
}

impl From<SpeechError> for ApiError {
    fn from(err: SpeechError) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

impl From<VideoError> for ApiError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::Validation(msg) => ApiError::BadRequest(msg),
            VideoError::JobNotFound(id) => ApiError::NotFound(format!("job not found: {}", id)),
            VideoError::QueueFull { .. } | VideoError::DispatcherClosed => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            VideoError::Timeout(_) => ApiError::GatewayTimeout(err.to_string()),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn video_errors_map_to_statuses() {
        let cases = [
            (VideoError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (VideoError::QueueFull { capacity: 16 }, StatusCode::SERVICE_UNAVAILABLE),
            (VideoError::Timeout(Duration::from_secs(5)), StatusCode::GATEWAY_TIMEOUT),
            (VideoError::Media("ffmpeg".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn unavailable_carries_retry_after() {
        let response = ApiError::ServiceUnavailable("queue full".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "30");

        let response = PlainText(ApiError::BadRequest("Invalid text".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
