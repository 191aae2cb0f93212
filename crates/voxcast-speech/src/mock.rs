//! In-process engine stand-ins for tests.

use crate::convert::VoiceConverter;
use crate::error::SpeechError;
use crate::tts::{TextToSpeech, VoiceSelector};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns a fixed list of chunks for every request.
#[derive(Debug, Default)]
pub struct MockTts {
    chunks: Vec<Vec<f32>>,
    calls: AtomicUsize,
}

impl MockTts {
    pub fn new(chunks: Vec<Vec<f32>>) -> Self {
        Self {
            chunks,
            calls: AtomicUsize::new(0),
        }
    }

    /// An engine that never emits a chunk.
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(
        &self,
        _text: &str,
        _voice: &VoiceSelector,
    ) -> Result<Vec<Vec<f32>>, SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chunks.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterBehavior {
    /// Copies the input to `<output_dir>/converted.wav`.
    Passthrough,
    /// Reports success with an empty result list.
    Empty,
    /// Writes a file that is not WAV.
    Garbage,
}

#[derive(Debug)]
pub struct MockConverter {
    behavior: ConverterBehavior,
    calls: AtomicUsize,
}

impl MockConverter {
    pub fn new(behavior: ConverterBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn passthrough() -> Self {
        Self::new(ConverterBehavior::Passthrough)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceConverter for MockConverter {
    async fn convert(
        &self,
        input: &Path,
        _tag: &str,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, SpeechError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let target = output_dir.join("converted.wav");
        match self.behavior {
            ConverterBehavior::Passthrough => {
                tokio::fs::copy(input, &target).await?;
                Ok(vec![target])
            }
            ConverterBehavior::Empty => Ok(Vec::new()),
            ConverterBehavior::Garbage => {
                tokio::fs::write(&target, b"not audio").await?;
                Ok(vec![target])
            }
        }
    }
}
