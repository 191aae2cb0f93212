use crate::error::SpeechError;
use crate::frames::decode_frames;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use voxcast_types::SPEECH_SAMPLE_RATE;

/// Maximum text input size for TTS (64 KiB).
pub const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(300);

fn default_voice() -> String {
    "af_heart".to_string()
}

fn default_speed() -> f32 {
    1.0
}

/// Which built-in voice the TTS engine renders with, and how fast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSelector {
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl Default for VoiceSelector {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            speed: default_speed(),
        }
    }
}

impl VoiceSelector {
    pub fn validate(&self) -> Result<(), SpeechError> {
        if self.voice.trim().is_empty() {
            return Err(SpeechError::Config("voice must not be empty".to_string()));
        }
        if !(0.1..=10.0).contains(&self.speed) {
            return Err(SpeechError::Config(
                "Speed must be between 0.1 and 10.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Renders text into an ordered sequence of audio chunks.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Returns the chunks in emission order. An empty vector means the
    /// model produced nothing; callers decide whether that is an error.
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSelector,
    ) -> Result<Vec<Vec<f32>>, SpeechError>;

    /// Sample rate of every chunk this engine returns.
    fn sample_rate(&self) -> u32 {
        SPEECH_SAMPLE_RATE
    }
}

/// Kokoro TTS driven as a subprocess.
///
/// The engine binary receives the text on stdin and writes length-prefixed
/// `f32` frames (see [`crate::frames`]) on stdout, one per chunk.
#[derive(Debug, Clone)]
pub struct KokoroEngine {
    binary: PathBuf,
    lang_code: String,
    timeout: Duration,
}

impl KokoroEngine {
    pub fn new(binary: impl AsRef<Path>, lang_code: impl Into<String>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            lang_code: lang_code.into(),
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, voice: &VoiceSelector) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--lang")
            .arg(&self.lang_code)
            .arg("--voice")
            .arg(&voice.voice)
            .arg("--speed")
            .arg(voice.speed.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl TextToSpeech for KokoroEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceSelector,
    ) -> Result<Vec<Vec<f32>>, SpeechError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(SpeechError::Engine(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }
        voice.validate()?;

        let mut child = self
            .command(voice)
            .spawn()
            .map_err(|e| SpeechError::Engine(format!("Failed to spawn kokoro: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SpeechError::Engine("Failed to open stdin".to_string()))?;
        let text_owned = text.to_string();

        // Written from a separate task so a full stdout pipe cannot deadlock us.
        let write_task = tokio::spawn(async move {
            stdin.write_all(text_owned.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                SpeechError::Engine(format!(
                    "TTS process timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| SpeechError::Engine(format!("Failed to wait for kokoro: {}", e)))?;

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(SpeechError::Engine(format!(
                    "Failed to write to kokoro stdin: {}",
                    e
                )))
            }
            Err(e) => return Err(SpeechError::Engine(format!("Stdin task failed: {}", e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Engine(format!("Kokoro failed: {}", stderr.trim())));
        }

        let chunks =
            decode_frames(&output.stdout).map_err(|e| SpeechError::Engine(e.to_string()))?;

        tracing::debug!(
            chunks = chunks.len(),
            voice = %voice.voice,
            "kokoro synthesis finished"
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_defaults_match_stock_voice() {
        let selector: VoiceSelector = serde_json::from_str("{}").unwrap();
        assert_eq!(selector.voice, "af_heart");
        assert_eq!(selector.speed, 1.0);
    }

    #[test]
    fn selector_rejects_out_of_range_speed() {
        for speed in [0.0, 0.05, 10.5] {
            let selector = VoiceSelector {
                speed,
                ..VoiceSelector::default()
            };
            assert!(matches!(selector.validate(), Err(SpeechError::Config(_))));
        }
    }

    #[tokio::test]
    async fn oversized_text_is_rejected_before_spawning() {
        let engine = KokoroEngine::new("/nonexistent/kokoro", "a");
        let text = "a".repeat(MAX_TTS_INPUT_BYTES + 1);
        match engine.synthesize(&text, &VoiceSelector::default()).await {
            Err(SpeechError::Engine(msg)) => assert!(msg.contains("exceeds maximum size")),
            other => panic!("expected Engine error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_an_engine_error() {
        let engine = KokoroEngine::new("/nonexistent/kokoro", "a");
        match engine.synthesize("Hello", &VoiceSelector::default()).await {
            Err(SpeechError::Engine(msg)) => assert!(msg.contains("Failed to spawn kokoro")),
            other => panic!("expected spawn failure, got {:?}", other),
        }
    }
}
