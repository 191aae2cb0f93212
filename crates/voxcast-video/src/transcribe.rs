//! Speech transcription/translation backends.

use crate::error::VideoError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use voxcast_types::TranscriptSegment;

const DEFAULT_TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(1200);

/// Whether Whisper keeps the spoken language or translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscribeTask {
    Transcribe,
    #[default]
    Translate,
}

/// Produces timestamped segments for a mono audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, VideoError>;
}

/// Accepts short language codes such as `en`, `pt-BR` or `yue`.
pub fn validate_language(code: &str) -> Result<(), VideoError> {
    let valid = (2..=8).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
        && !code.starts_with('-')
        && !code.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(VideoError::Validation(format!(
            "invalid language code: {:?}",
            code
        )))
    }
}

// ── whisper.cpp CLI ──

#[derive(Debug, Deserialize)]
struct CliOutput {
    #[serde(default)]
    transcription: Vec<CliSegment>,
}

#[derive(Debug, Deserialize)]
struct CliSegment {
    offsets: CliOffsets,
    text: String,
}

/// Millisecond offsets from the start of the audio.
#[derive(Debug, Deserialize)]
struct CliOffsets {
    from: u64,
    to: u64,
}

/// Parses the JSON file written by `whisper-cli -oj`.
pub fn parse_cli_json(json: &str) -> Result<Vec<TranscriptSegment>, VideoError> {
    let output: CliOutput = serde_json::from_str(json)
        .map_err(|e| VideoError::Transcription(format!("unreadable whisper output: {}", e)))?;
    let mut segments: Vec<TranscriptSegment> = output
        .transcription
        .into_iter()
        .map(|s| {
            TranscriptSegment::new(
                s.offsets.from as f64 / 1000.0,
                s.offsets.to as f64 / 1000.0,
                s.text,
            )
        })
        .collect();
    TranscriptSegment::sort_by_start(&mut segments);
    Ok(segments)
}

/// `whisper.cpp` driven as a subprocess.
#[derive(Debug, Clone)]
pub struct WhisperCliTranscriber {
    binary: PathBuf,
    model_path: PathBuf,
    task: TranscribeTask,
    timeout: Duration,
}

impl WhisperCliTranscriber {
    pub fn new(
        binary: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
        task: TranscribeTask,
    ) -> Self {
        Self {
            binary: binary.into(),
            model_path: model_path.into(),
            task,
            timeout: DEFAULT_TRANSCRIBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, VideoError> {
        validate_language(language)?;

        // whisper-cli appends ".json" to the -of prefix.
        let prefix = audio.with_extension("");
        let json_path = prefix.with_extension("json");

        let mut command = Command::new(&self.binary);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(audio)
            .arg("-l")
            .arg(language);
        if self.task == TranscribeTask::Translate {
            command.arg("-tr");
        }
        command
            .arg("-oj")
            .arg("-of")
            .arg(&prefix)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| VideoError::Transcription(format!("Failed to spawn whisper: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                VideoError::Transcription(format!(
                    "whisper timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| VideoError::Transcription(format!("Failed to wait for whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::Transcription(format!(
                "whisper failed: {}",
                stderr.trim()
            )));
        }

        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            VideoError::Transcription(format!(
                "whisper output {} unreadable: {}",
                json_path.display(),
                e
            ))
        })?;
        let segments = parse_cli_json(&json)?;

        tracing::info!(segments = segments.len(), language, "whisper transcription finished");
        Ok(segments)
    }
}

// ── OpenAI-compatible HTTP ──

#[derive(Debug, Deserialize)]
struct VerboseResponse {
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Parses a `response_format=verbose_json` body.
pub fn parse_verbose_json(json: &str) -> Result<Vec<TranscriptSegment>, VideoError> {
    let response: VerboseResponse = serde_json::from_str(json)
        .map_err(|e| VideoError::Transcription(format!("unreadable response: {}", e)))?;
    let mut segments: Vec<TranscriptSegment> = response
        .segments
        .into_iter()
        .map(|s| TranscriptSegment::new(s.start, s.end, s.text))
        .collect();
    TranscriptSegment::sort_by_start(&mut segments);
    Ok(segments)
}

/// Whisper behind an OpenAI-compatible `/audio/*` API.
#[derive(Debug, Clone)]
pub struct WhisperHttpTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    task: TranscribeTask,
}

impl WhisperHttpTranscriber {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        task: TranscribeTask,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            task,
        }
    }

    fn endpoint(&self) -> String {
        match self.task {
            TranscribeTask::Translate => format!("{}/audio/translations", self.base_url),
            TranscribeTask::Transcribe => format!("{}/audio/transcriptions", self.base_url),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperHttpTranscriber {
    async fn transcribe(
        &self,
        audio: &Path,
        language: &str,
    ) -> Result<Vec<TranscriptSegment>, VideoError> {
        validate_language(language)?;

        let audio_data = tokio::fs::read(audio).await?;
        let file_part = reqwest::multipart::Part::bytes(audio_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| VideoError::Transcription(format!("mime: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("language", language.to_string())
            .part("file", file_part);

        tracing::debug!(
            model = %self.model,
            url = %self.endpoint(),
            "sending audio to whisper API"
        );

        let mut request = self.client.post(self.endpoint()).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VideoError::Transcription(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(VideoError::Transcription(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VideoError::Transcription(format!("body: {}", e)))?;
        let segments = parse_verbose_json(&body)?;

        tracing::info!(segments = segments.len(), language, "whisper API transcription finished");
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes() {
        for ok in ["en", "fr", "pt-BR", "yue"] {
            assert!(validate_language(ok).is_ok(), "{ok} should be valid");
        }
        for bad in ["", "e", "en_US", "-en", "en-", "toolonglang", "e1", "../x"] {
            assert!(
                matches!(validate_language(bad), Err(VideoError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn cli_json_offsets_become_seconds() {
        let json = r#"{
            "result": {"language": "en"},
            "transcription": [
                {"timestamps": {"from": "00:00:02,500", "to": "00:00:04,000"},
                 "offsets": {"from": 2500, "to": 4000}, "text": " second"},
                {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,500"},
                 "offsets": {"from": 0, "to": 2500}, "text": " first"}
            ]
        }"#;
        let segments = parse_cli_json(json).unwrap();
        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new(0.0, 2.5, " first"),
                TranscriptSegment::new(2.5, 4.0, " second"),
            ]
        );
    }

    #[test]
    fn cli_json_without_transcription_is_empty() {
        assert!(parse_cli_json(r#"{"result": {}}"#).unwrap().is_empty());
        assert!(matches!(
            parse_cli_json("not json"),
            Err(VideoError::Transcription(_))
        ));
    }

    #[test]
    fn verbose_json_segments() {
        let json = r#"{
            "task": "translate",
            "language": "german",
            "duration": 4.2,
            "text": "Hello world",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 1.8, "text": " Hello", "tokens": [1]},
                {"id": 1, "seek": 0, "start": 1.8, "end": 4.2, "text": " world", "tokens": [2]}
            ]
        }"#;
        let segments = parse_verbose_json(json).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1], TranscriptSegment::new(1.8, 4.2, " world"));
    }

    #[test]
    fn http_endpoint_follows_task() {
        let translate = WhisperHttpTranscriber::new(
            "http://whisper:8000/v1/",
            None,
            "medium",
            TranscribeTask::Translate,
        );
        assert_eq!(translate.endpoint(), "http://whisper:8000/v1/audio/translations");

        let transcribe = WhisperHttpTranscriber::new(
            "http://whisper:8000/v1",
            None,
            "medium",
            TranscribeTask::Transcribe,
        );
        assert_eq!(transcribe.endpoint(), "http://whisper:8000/v1/audio/transcriptions");
    }

    #[tokio::test]
    async fn cli_rejects_bad_language_before_spawning() {
        let whisper = WhisperCliTranscriber::new(
            "/nonexistent/whisper",
            "model.bin",
            TranscribeTask::Translate,
        );
        let result = whisper.transcribe(Path::new("audio.wav"), "en_US").await;
        assert!(matches!(result, Err(VideoError::Validation(_))));
    }
}
