//! On-disk job directories plus their persisted status.

use crate::error::VideoError;
use std::path::{Path, PathBuf};
use voxcast_db::{get_job, insert_job, update_status, DbPool, JobRecord};
use voxcast_types::{JobId, JobStatus};

/// File layout of one job directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub dir: PathBuf,
    pub input: PathBuf,
    pub audio: PathBuf,
    pub subtitles: PathBuf,
    pub output: PathBuf,
}

impl JobPaths {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            input: dir.join("input.mp4"),
            audio: dir.join("audio.wav"),
            subtitles: dir.join("subs.srt"),
            output: dir.join("final.mp4"),
            dir,
        }
    }
}

#[derive(Clone)]
pub struct JobStore {
    root: PathBuf,
    pool: DbPool,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>, pool: DbPool) -> Self {
        Self {
            root: root.into(),
            pool,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self, id: JobId) -> JobPaths {
        JobPaths::new(self.root.join(id.to_string()))
    }

    /// Allocates an id, stores the upload as `input.mp4` and records the
    /// job in `created` state.
    pub async fn create(&self, target_lang: &str, video: &[u8]) -> Result<JobId, VideoError> {
        let id = JobId::new();
        let paths = self.paths(id);

        tokio::fs::create_dir_all(&paths.dir).await?;
        tokio::fs::write(&paths.input, video).await?;

        let pool = self.pool.clone();
        let lang = target_lang.to_string();
        let inserted = tokio::task::spawn_blocking(move || -> Result<(), VideoError> {
            let conn = pool.get()?;
            insert_job(&conn, id, &lang)?;
            Ok(())
        })
        .await?;

        if let Err(e) = inserted {
            // Without a row the directory is unreachable.
            if let Err(cleanup) = tokio::fs::remove_dir_all(&paths.dir).await {
                tracing::warn!(
                    job_id = %id,
                    error = %cleanup,
                    "failed to remove orphan job directory"
                );
            }
            return Err(e);
        }

        tracing::info!(job_id = %id, target_lang, bytes = video.len(), "video job created");
        Ok(id)
    }

    /// Removes the job directory. The job's row is kept.
    pub async fn discard_files(&self, id: JobId) {
        let dir = self.paths(id).dir;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!(job_id = %id, "job files discarded"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "failed to discard job files");
            }
        }
    }

    pub async fn set_status(&self, id: JobId, status: JobStatus) -> Result<(), VideoError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<(), VideoError> {
            let conn = pool.get()?;
            update_status(&conn, id, &status)?;
            Ok(())
        })
        .await?
    }

    pub async fn get(&self, id: JobId) -> Result<Option<JobRecord>, VideoError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<JobRecord>, VideoError> {
            let conn = pool.get()?;
            Ok(get_job(&conn, id)?)
        })
        .await?
    }
}
