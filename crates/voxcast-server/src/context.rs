//! Engines and limits shared by every request.
//!
//! Built once before the listener binds. Every model file the engines
//! need is checked here, so a worker with a missing artifact never serves
//! a request.

use crate::config::{Config, TranscriberBackend};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use voxcast_speech::{
    ensure_artifacts, KokoroEngine, RvcConverter, SpeechError, SpeechPipeline, VoiceSelector,
};
use voxcast_types::VoiceProfile;
use voxcast_video::{
    FfmpegMedia, Transcriber, VideoPipeline, WhisperCliTranscriber, WhisperHttpTranscriber,
};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Immutable after construction; handlers reach it through an `Arc`.
pub struct WorkerContext {
    pub speech: SpeechPipeline,
    pub video: VideoPipeline,
    /// Permits for GPU-bound pipeline runs, shared by speech and video.
    pub gpu: Arc<Semaphore>,
    pub speech_timeout: Duration,
}

impl WorkerContext {
    pub fn new(
        speech: SpeechPipeline,
        video: VideoPipeline,
        gpu_permits: usize,
        speech_timeout: Duration,
    ) -> Self {
        Self {
            speech,
            video,
            gpu: Arc::new(Semaphore::new(gpu_permits)),
            speech_timeout,
        }
    }

    /// Wires the subprocess engines described by `config`.
    ///
    /// # Errors
    ///
    /// [`SpeechError::MissingArtifact`] (wrapped) when a profile file, a
    /// required artifact or the Whisper CLI model is absent.
    pub fn build(config: &Config) -> Result<Self, ContextError> {
        if config.gpu.max_concurrency == 0 {
            return Err(ContextError::Config(
                "gpu.max_concurrency must be at least 1".to_string(),
            ));
        }

        let required: Vec<_> = config
            .speech
            .required_artifacts
            .iter()
            .map(|p| config.model_path(p))
            .collect();
        ensure_artifacts(&required)?;

        let speech_timeout = Duration::from_secs(config.speech.timeout_secs);
        let video_timeout = Duration::from_secs(config.video.timeout_secs);

        let voice = VoiceSelector {
            voice: config.speech.voice.clone(),
            speed: config.speech.speed,
        };
        voice.validate()?;

        let profile = VoiceProfile {
            model_path: config.model_path(&config.speech.profile.model_path),
            index_path: config.model_path(&config.speech.profile.index_path),
            ..config.speech.profile.clone()
        };
        let profile_tag = profile.tag.clone();

        let tts = KokoroEngine::new(&config.speech.engine_binary, config.speech.lang_code.clone())
            .with_timeout(speech_timeout);
        let converter = RvcConverter::new(&config.speech.converter_binary, [profile])?
            .with_timeout(speech_timeout);
        let speech = SpeechPipeline::new(Arc::new(tts), Arc::new(converter), voice, profile_tag);

        let transcriber: Arc<dyn Transcriber> = match config.transcriber.backend {
            TranscriberBackend::WhisperCli => {
                let model = config.model_path(&config.transcriber.model_path);
                ensure_artifacts(&[&model])?;
                Arc::new(
                    WhisperCliTranscriber::new(
                        &config.transcriber.binary,
                        model,
                        config.transcriber.task,
                    )
                    .with_timeout(video_timeout),
                )
            }
            TranscriberBackend::Openai => Arc::new(WhisperHttpTranscriber::new(
                config.transcriber.base_url.clone(),
                config.transcriber.api_key.clone(),
                config.transcriber.model.clone(),
                config.transcriber.task,
            )),
        };

        let media =
            Arc::new(FfmpegMedia::new(&config.video.ffmpeg_binary).with_timeout(video_timeout));
        let video = VideoPipeline::new(media.clone(), transcriber, media);

        tracing::info!(
            profile = %speech.profile_tag(),
            gpu_permits = config.gpu.max_concurrency,
            transcriber = ?config.transcriber.backend,
            "worker context ready"
        );

        Ok(Self::new(
            speech,
            video,
            config.gpu.max_concurrency,
            speech_timeout,
        ))
    }
}
