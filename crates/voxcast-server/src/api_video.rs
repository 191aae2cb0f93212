//! Video subtitle endpoints and job status.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Extension, Path},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use voxcast_types::{JobId, JobStatus, DEFAULT_TARGET_LANG};
use voxcast_video::validate_language;

/// Header carrying the subtitle language.
pub const TARGET_LANG_HEADER: &str = "x-target-lang";

#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub job_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobView {
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub target_lang: String,
    pub created_at: String,
    pub updated_at: String,
}

fn target_lang(headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(value) = headers.get(TARGET_LANG_HEADER) else {
        return Ok(DEFAULT_TARGET_LANG.to_string());
    };
    let lang = value
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("{} must be ASCII", TARGET_LANG_HEADER)))?
        .trim();
    validate_language(lang)?;
    Ok(lang.to_string())
}

/// Validates the upload and stores it as a new job.
async fn accept_upload(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<(JobId, String), ApiError> {
    let lang = target_lang(headers)?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("request body is empty".to_string()));
    }

    let id = state.jobs.store().create(&lang, body).await.map_err(|e| {
        tracing::error!(error = %e, "failed to create video job");
        ApiError::from(e)
    })?;
    Ok((id, lang))
}

/// Handler for `POST /video-translate`. Returns once `final.mp4` exists.
pub async fn translate_video_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<JobAccepted>, ApiError> {
    let (id, lang) = accept_upload(&state, &headers, &body).await?;

    let output = state.jobs.submit_and_wait(id, &lang).await?;

    Ok(Json(JobAccepted {
        job_id: id.to_string(),
        status: "done",
        output: Some(output.to_string_lossy().into_owned()),
    }))
}

/// Handler for `POST /video-translate/async`. Returns as soon as the job
/// is queued.
pub async fn submit_video_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<JobAccepted>), ApiError> {
    let (id, lang) = accept_upload(&state, &headers, &body).await?;

    state.jobs.submit(id, &lang).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id: id.to_string(),
            status: "processing",
            output: None,
        }),
    ))
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("job not found: {}", raw)))
}

/// Handler for `GET /jobs/{job_id}`.
pub async fn get_job_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    let id = parse_job_id(&job_id)?;
    let record = state
        .jobs
        .store()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job not found: {}", id)))?;

    Ok(Json(JobView {
        job_id: record.id.to_string(),
        status: record.status.as_str().to_string(),
        output: record
            .status
            .output()
            .map(|p| p.to_string_lossy().into_owned()),
        error: record.status.error().map(str::to_string),
        target_lang: record.target_lang,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}

/// Handler for `GET /jobs/{job_id}/output`. Streams `final.mp4`.
pub async fn get_job_output_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_job_id(&job_id)?;
    let record = state.jobs.store().get(id).await?;

    let output = match record.map(|r| r.status) {
        Some(JobStatus::Succeeded { output }) => output,
        Some(_) => return Err(ApiError::NotFound(format!("job {} has no output", id))),
        None => return Err(ApiError::NotFound(format!("job not found: {}", id))),
    };

    let file = tokio::fs::File::open(&output).await.map_err(|e| {
        tracing::warn!(job_id = %id, error = %e, "job output missing on disk");
        ApiError::NotFound(format!("job {} has no output", id))
    })?;
    let length = file.metadata().await.ok().map(|m| m.len());

    let mut response = (
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename={}.mp4", id),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response();
    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, length.into());
    }
    Ok(response)
}
