use std::time::Duration;
use thiserror::Error;
use voxcast_types::JobId;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("media processing failed: {0}")]
    Media(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("job queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },

    #[error("job dispatcher has shut down")]
    DispatcherClosed,

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("job timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("job store error: {0}")]
    Store(#[from] voxcast_db::JobError),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
