use crate::convert::VoiceConverter;
use crate::error::SpeechError;
use crate::tts::{TextToSpeech, VoiceSelector};
use crate::wav::{encode_wav, inspect_wav};
use std::path::PathBuf;
use std::sync::Arc;
use voxcast_types::AudioBuffer;

/// Text → TTS chunks → base WAV → voice conversion → WAV bytes.
///
/// Holds only shared, read-only engine handles; one instance serves every
/// request. Each run gets its own scratch directory, removed when the run
/// ends.
#[derive(Clone)]
pub struct SpeechPipeline {
    tts: Arc<dyn TextToSpeech>,
    converter: Arc<dyn VoiceConverter>,
    voice: VoiceSelector,
    profile_tag: String,
    scratch_root: Option<PathBuf>,
}

impl SpeechPipeline {
    pub fn new(
        tts: Arc<dyn TextToSpeech>,
        converter: Arc<dyn VoiceConverter>,
        voice: VoiceSelector,
        profile_tag: impl Into<String>,
    ) -> Self {
        Self {
            tts,
            converter,
            voice,
            profile_tag: profile_tag.into(),
            scratch_root: None,
        }
    }

    /// Places scratch directories under `root` instead of the system
    /// temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn profile_tag(&self) -> &str {
        &self.profile_tag
    }

    /// Runs TTS and concatenates its chunks in emission order.
    pub async fn synthesize(&self, text: &str) -> Result<AudioBuffer, SpeechError> {
        let chunks = self.tts.synthesize(text, &self.voice).await?;
        if chunks.is_empty() {
            return Err(SpeechError::EmptyOutput);
        }
        let chunk_count = chunks.len();
        let buffer = AudioBuffer::from_chunks(self.tts.sample_rate(), chunks);
        tracing::debug!(
            chunks = chunk_count,
            samples = buffer.len(),
            duration_secs = buffer.duration_secs(),
            "speech synthesized"
        );
        Ok(buffer)
    }

    /// Runs the whole pipeline and returns the converted WAV bytes.
    pub async fn run(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let buffer = self.synthesize(text).await?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("voxcast-tts-");
        let scratch = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let base_wav = scratch.path().join("base.wav");
        tokio::fs::write(&base_wav, encode_wav(&buffer)?).await?;

        let output_dir = scratch.path().join("converted");
        tokio::fs::create_dir_all(&output_dir).await?;

        let outputs = self
            .converter
            .convert(&base_wav, &self.profile_tag, &output_dir)
            .await?;
        let converted = outputs.into_iter().next().ok_or_else(|| {
            SpeechError::Conversion("converter returned no result".to_string())
        })?;

        let bytes = tokio::fs::read(&converted).await.map_err(|e| {
            SpeechError::Conversion(format!(
                "cannot read converted file {}: {}",
                converted.display(),
                e
            ))
        })?;
        let spec = inspect_wav(&bytes)
            .map_err(|e| SpeechError::Conversion(format!("converted output is not WAV: {}", e)))?;

        tracing::info!(
            profile = %self.profile_tag,
            bytes = bytes.len(),
            sample_rate = spec.sample_rate,
            "speech pipeline finished"
        );

        Ok(bytes)
    }
}
