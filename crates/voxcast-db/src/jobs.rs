//! Persistence for video job state.
//!
//! Rows are created in `created` state when a request is received and only
//! move forward from there. Once a job reaches `done` or `failed` its row
//! is frozen; [`update_status`] refuses to change it.

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use voxcast_types::{JobId, JobStatus, ParseJobStatusError};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("job {id} is already {status} and cannot move to {requested}")]
    AlreadyFinished {
        id: JobId,
        status: String,
        requested: String,
    },

    #[error("corrupt job row {id}: {source}")]
    Corrupt {
        id: String,
        source: ParseJobStatusError,
    },
}

/// A row of the `video_jobs` table.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub target_lang: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Records a freshly received job in `created` state.
pub fn insert_job(conn: &Connection, id: JobId, target_lang: &str) -> Result<(), JobError> {
    conn.execute(
        "INSERT INTO video_jobs (id, status, target_lang) VALUES (?1, ?2, ?3)",
        params![id.to_string(), JobStatus::Created.as_str(), target_lang],
    )?;
    Ok(())
}

/// Moves a job to `status`, storing its output path or failure reason.
pub fn update_status(conn: &Connection, id: JobId, status: &JobStatus) -> Result<(), JobError> {
    let output = status
        .output()
        .map(|p| p.to_string_lossy().into_owned());

    let changed = conn.execute(
        "UPDATE video_jobs
         SET status = ?2, output_path = ?3, error = ?4, updated_at = datetime('now')
         WHERE id = ?1 AND status NOT IN ('done', 'failed')",
        params![id.to_string(), status.as_str(), output, status.error()],
    )?;

    if changed == 1 {
        return Ok(());
    }

    match get_job(conn, id)? {
        Some(existing) => Err(JobError::AlreadyFinished {
            id,
            status: existing.status.as_str().to_string(),
            requested: status.as_str().to_string(),
        }),
        None => Err(JobError::NotFound(id)),
    }
}

pub fn get_job(conn: &Connection, id: JobId) -> Result<Option<JobRecord>, JobError> {
    let row = conn
        .query_row(
            "SELECT status, output_path, error, target_lang, created_at, updated_at
             FROM video_jobs WHERE id = ?1",
            [id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((label, output, error, target_lang, created_at, updated_at)) = row else {
        return Ok(None);
    };

    let status = JobStatus::from_parts(&label, output, error).map_err(|source| JobError::Corrupt {
        id: id.to_string(),
        source,
    })?;

    Ok(Some(JobRecord {
        id,
        status,
        target_lang,
        created_at,
        updated_at,
    }))
}

/// Fails every job left `created` or `processing` by a previous process.
///
/// Queued work does not survive a restart, so these jobs would otherwise
/// report progress forever.
pub fn fail_interrupted_jobs(conn: &Connection) -> Result<usize, JobError> {
    let changed = conn.execute(
        "UPDATE video_jobs
         SET status = 'failed',
             error = 'interrupted by server restart',
             updated_at = datetime('now')
         WHERE status IN ('created', 'processing')",
        [],
    )?;
    Ok(changed)
}
