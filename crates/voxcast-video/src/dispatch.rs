//! Bounded video job queue and its worker tasks.
//!
//! Submissions never block: when `queue_capacity` jobs are already waiting
//! the new job is marked failed and [`VideoError::QueueFull`] is returned.
//! Each worker holds a permit from the shared GPU semaphore for the whole
//! pipeline run, so video jobs and speech requests never overlap beyond
//! `gpu.max_concurrency`.

use crate::error::VideoError;
use crate::pipeline::VideoPipeline;
use crate::store::JobStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex, Semaphore};
use tracing::Instrument;
use voxcast_types::{JobId, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub queue_capacity: usize,
    pub workers: usize,
    /// Wall-clock limit for one pipeline run, excluding time spent queued.
    pub timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            workers: 1,
            timeout: Duration::from_secs(1800),
        }
    }
}

struct QueuedJob {
    id: JobId,
    target_lang: String,
    reply: Option<oneshot::Sender<Result<PathBuf, VideoError>>>,
}

/// Handle used by request handlers to enqueue jobs.
///
/// Workers exit once every handle has been dropped and the queue drained.
#[derive(Clone)]
pub struct JobDispatcher {
    sender: mpsc::Sender<QueuedJob>,
    store: JobStore,
    capacity: usize,
}

impl JobDispatcher {
    /// Spawns `settings.workers` worker tasks on the current runtime.
    pub fn start(
        store: JobStore,
        pipeline: VideoPipeline,
        settings: DispatchSettings,
        gpu: Arc<Semaphore>,
    ) -> Self {
        let capacity = settings.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        for index in 0..settings.workers.max(1) {
            let worker = Worker {
                receiver: Arc::clone(&receiver),
                store: store.clone(),
                pipeline: pipeline.clone(),
                gpu: Arc::clone(&gpu),
                timeout: settings.timeout,
            };
            tokio::spawn(worker.run().instrument(tracing::info_span!("video_worker", index)));
        }

        tracing::info!(
            capacity,
            workers = settings.workers.max(1),
            timeout_secs = settings.timeout.as_secs(),
            "video job dispatcher started"
        );

        Self {
            sender,
            store,
            capacity,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Enqueues a job and returns as soon as it is accepted.
    pub async fn submit(&self, id: JobId, target_lang: &str) -> Result<(), VideoError> {
        self.enqueue(QueuedJob {
            id,
            target_lang: target_lang.to_string(),
            reply: None,
        })
        .await
    }

    /// Enqueues a job and waits for its pipeline to finish.
    pub async fn submit_and_wait(
        &self,
        id: JobId,
        target_lang: &str,
    ) -> Result<PathBuf, VideoError> {
        let (reply, done) = oneshot::channel();
        self.enqueue(QueuedJob {
            id,
            target_lang: target_lang.to_string(),
            reply: Some(reply),
        })
        .await?;

        done.await.map_err(|_| VideoError::DispatcherClosed)?
    }

    async fn enqueue(&self, job: QueuedJob) -> Result<(), VideoError> {
        let id = job.id;
        let (error, reason) = match self.sender.try_send(job) {
            Ok(()) => {
                tracing::debug!(job_id = %id, "video job queued");
                return Ok(());
            }
            Err(mpsc::error::TrySendError::Full(_)) => (
                VideoError::QueueFull {
                    capacity: self.capacity,
                },
                "queue full",
            ),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                (VideoError::DispatcherClosed, "dispatcher closed")
            }
        };

        tracing::warn!(job_id = %id, reason, "video job rejected");
        if let Err(e) = self
            .store
            .set_status(
                id,
                JobStatus::Failed {
                    reason: reason.to_string(),
                },
            )
            .await
        {
            tracing::error!(job_id = %id, error = %e, "failed to record rejected job");
        }
        // The row stays queryable; the upload goes.
        self.store.discard_files(id).await;
        Err(error)
    }
}

struct Worker {
    receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    store: JobStore,
    pipeline: VideoPipeline,
    gpu: Arc<Semaphore>,
    timeout: Duration,
}

impl Worker {
    async fn run(self) {
        tracing::info!("video worker started");
        loop {
            let next = { self.receiver.lock().await.recv().await };
            let Some(job) = next else { break };

            let span = tracing::info_span!(
                "video_job",
                job_id = %job.id,
                target_lang = %job.target_lang,
            );
            self.process(job).instrument(span).await;
        }
        tracing::info!("video worker stopped: queue closed");
    }

    async fn process(&self, job: QueuedJob) {
        let result = self.execute(job.id, &job.target_lang).await;

        let status = match &result {
            Ok(output) => {
                tracing::info!(output = %output.display(), "video job finished");
                JobStatus::Succeeded {
                    output: output.clone(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "video job failed");
                JobStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        if let Err(e) = self.store.set_status(job.id, status).await {
            tracing::error!(error = %e, "failed to record job outcome");
        }

        if let Some(reply) = job.reply {
            // The waiting request may have gone away; the job is recorded either way.
            let _ = reply.send(result);
        }
    }

    async fn execute(&self, id: JobId, target_lang: &str) -> Result<PathBuf, VideoError> {
        let _permit = self
            .gpu
            .acquire()
            .await
            .map_err(|_| VideoError::DispatcherClosed)?;

        self.store.set_status(id, JobStatus::Processing).await?;
        tracing::debug!("GPU permit acquired, pipeline running");

        let paths = self.store.paths(id);
        tokio::time::timeout(self.timeout, self.pipeline.run(&paths, target_lang))
            .await
            .map_err(|_| VideoError::Timeout(self.timeout))?
    }
}
