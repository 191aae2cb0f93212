//! In-process stand-ins for ffmpeg and Whisper, used by tests.

use crate::error::VideoError;
use crate::media::{AudioExtractor, SubtitleBurner};
use crate::transcribe::Transcriber;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use voxcast_types::TranscriptSegment;

/// Writes a placeholder `audio.wav` and copies the input to the output
/// when burning.
#[derive(Debug, Default)]
pub struct MockMedia {
    fail_burn: bool,
    burns: AtomicUsize,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Burning always fails with a media error.
    pub fn failing_burn() -> Self {
        Self {
            fail_burn: true,
            ..Self::default()
        }
    }

    pub fn burns(&self) -> usize {
        self.burns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioExtractor for MockMedia {
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), VideoError> {
        if !tokio::fs::try_exists(video).await? {
            return Err(VideoError::Media(format!("{} not found", video.display())));
        }
        tokio::fs::write(audio_out, b"RIFF").await?;
        Ok(())
    }
}

#[async_trait]
impl SubtitleBurner for MockMedia {
    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        video_out: &Path,
    ) -> Result<(), VideoError> {
        self.burns.fetch_add(1, Ordering::SeqCst);
        if self.fail_burn {
            return Err(VideoError::Media("ffmpeg exited with status 1".into()));
        }
        if !tokio::fs::try_exists(subtitles).await? {
            return Err(VideoError::Media("subtitle file missing".into()));
        }
        tokio::fs::copy(video, video_out).await?;
        Ok(())
    }
}

/// Returns fixed segments, optionally waiting for [`MockTranscriber::release`]
/// first.
#[derive(Debug, Default)]
pub struct MockTranscriber {
    segments: Vec<TranscriptSegment>,
    fail: bool,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl MockTranscriber {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Blocks every call until `release` is called once per call.
    pub fn gated(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _audio: &Path,
        _language: &str,
    ) -> Result<Vec<TranscriptSegment>, VideoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(VideoError::Transcription("model crashed".into()));
        }
        Ok(self.segments.clone())
    }
}
