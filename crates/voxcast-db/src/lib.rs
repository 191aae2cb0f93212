//! Database layer for voxcast.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the `video_jobs` table that records the
//! lifecycle of every video job.
//!
//! All functions here are blocking. Async callers run them inside
//! `tokio::task::spawn_blocking`.

mod jobs;
mod migrations;
mod pool;

pub use jobs::{fail_interrupted_jobs, get_job, insert_job, update_status, JobError, JobRecord};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
