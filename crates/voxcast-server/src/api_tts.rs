//! `POST /tts`: text in, converted WAV out.

use crate::api::{ApiError, PlainText};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::Extension,
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use voxcast_speech::tts::MAX_TTS_INPUT_BYTES;

/// Extracts the `text` field of a `{"text": ...}` body.
///
/// Errors are the plain-text messages sent back with a 400.
pub fn parse_tts_request(body: &[u8]) -> Result<String, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| "Invalid JSON body".to_string())?;

    let text = match value.get("text") {
        Some(Value::String(text)) => text,
        _ => return Err("Invalid text".to_string()),
    };
    if text.trim().is_empty() {
        return Err("Invalid text".to_string());
    }
    if text.len() > MAX_TTS_INPUT_BYTES {
        return Err(format!("Text exceeds {} bytes", MAX_TTS_INPUT_BYTES));
    }
    Ok(text.clone())
}

/// Handler for `POST /tts`.
pub async fn tts_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, PlainText> {
    let text = parse_tts_request(&body).map_err(|msg| PlainText(ApiError::BadRequest(msg)))?;
    let context = &state.context;

    let _permit = context.gpu.acquire().await.map_err(|_| {
        PlainText(ApiError::ServiceUnavailable("GPU gate closed".to_string()))
    })?;

    let wav = tokio::time::timeout(context.speech_timeout, context.speech.run(&text))
        .await
        .map_err(|_| {
            tracing::warn!(
                timeout_secs = context.speech_timeout.as_secs(),
                chars = text.chars().count(),
                "speech request timed out"
            );
            PlainText(ApiError::GatewayTimeout(format!(
                "speech synthesis timed out after {} seconds",
                context.speech_timeout.as_secs()
            )))
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "speech request failed");
            PlainText(ApiError::from(e))
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CONTENT_DISPOSITION, "inline; filename=tts.wav"),
        ],
        wav,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_blank_text() {
        assert_eq!(parse_tts_request(br#"{"text":" hi "}"#).unwrap(), " hi ");
    }

    #[test]
    fn rejects_bad_bodies() {
        for body in [
            &br#"{}"#[..],
            br#"{"text": "   "}"#,
            br#"{"text": 42}"#,
            br#"{"text": null}"#,
            br#"["text"]"#,
        ] {
            assert_eq!(parse_tts_request(body).unwrap_err(), "Invalid text");
        }
        assert_eq!(parse_tts_request(b"{oops").unwrap_err(), "Invalid JSON body");
    }

    #[test]
    fn rejects_oversized_text() {
        let body = serde_json::json!({ "text": "a".repeat(MAX_TTS_INPUT_BYTES + 1) }).to_string();
        assert!(parse_tts_request(body.as_bytes())
            .unwrap_err()
            .starts_with("Text exceeds"));
    }
}
