//! Audio extraction and subtitle burning via `ffmpeg`.

use crate::error::VideoError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use voxcast_types::VIDEO_AUDIO_SAMPLE_RATE;

const DEFAULT_FFMPEG_TIMEOUT: Duration = Duration::from_secs(900);

/// Number of trailing stderr lines kept in error messages.
const STDERR_TAIL_LINES: usize = 12;

/// Demuxes the audio track of a video into a mono 16 kHz WAV file.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), VideoError>;
}

/// Renders a subtitle file into the video frames.
#[async_trait]
pub trait SubtitleBurner: Send + Sync {
    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        video_out: &Path,
    ) -> Result<(), VideoError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegMedia {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegMedia {
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            timeout: DEFAULT_FFMPEG_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), VideoError> {
        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VideoError::Media(format!("Failed to spawn ffmpeg: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                VideoError::Media(format!(
                    "ffmpeg timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| VideoError::Media(format!("Failed to wait for ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::Media(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioExtractor for FfmpegMedia {
    async fn extract_audio(&self, video: &Path, audio_out: &Path) -> Result<(), VideoError> {
        tracing::debug!(input = %video.display(), "extracting audio");
        self.run(extract_args(video, audio_out)).await
    }
}

#[async_trait]
impl SubtitleBurner for FfmpegMedia {
    async fn burn_subtitles(
        &self,
        video: &Path,
        subtitles: &Path,
        video_out: &Path,
    ) -> Result<(), VideoError> {
        tracing::debug!(input = %video.display(), "burning subtitles");
        self.run(burn_args(video, subtitles, video_out)).await
    }
}

/// `ffmpeg -y -i <video> -vn -ac 1 -ar 16000 <audio>`
pub fn extract_args(video: &Path, audio_out: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        video.as_os_str().to_owned(),
        "-vn".into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        VIDEO_AUDIO_SAMPLE_RATE.to_string().into(),
        audio_out.as_os_str().to_owned(),
    ]
}

/// `ffmpeg -y -i <video> -vf subtitles=<srt> -c:a copy <out>`
pub fn burn_args(video: &Path, subtitles: &Path, video_out: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        video.as_os_str().to_owned(),
        "-vf".into(),
        format!(
            "subtitles={}",
            escape_filter_path(&subtitles.to_string_lossy())
        )
        .into(),
        "-c:a".into(),
        "copy".into(),
        video_out.as_os_str().to_owned(),
    ]
}

/// Escapes characters the filtergraph parser treats as syntax.
pub fn escape_filter_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | ';' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn extract_command_downmixes_to_16k_mono() {
        let args = strings(extract_args(
            Path::new("/jobs/a/input.mp4"),
            Path::new("/jobs/a/audio.wav"),
        ));
        assert_eq!(
            args,
            [
                "-y",
                "-i",
                "/jobs/a/input.mp4",
                "-vn",
                "-ac",
                "1",
                "-ar",
                "16000",
                "/jobs/a/audio.wav"
            ]
        );
    }

    #[test]
    fn burn_command_copies_audio() {
        let args = strings(burn_args(
            Path::new("/jobs/a/input.mp4"),
            Path::new("/jobs/a/subs.srt"),
            Path::new("/jobs/a/final.mp4"),
        ));
        assert_eq!(args[3], "-vf");
        assert_eq!(args[4], "subtitles=/jobs/a/subs.srt");
        assert_eq!(&args[5..], ["-c:a", "copy", "/jobs/a/final.mp4"]);
    }

    #[test]
    fn filter_path_escaping() {
        assert_eq!(escape_filter_path("/plain/subs.srt"), "/plain/subs.srt");
        assert_eq!(escape_filter_path("C:\\jobs\\subs.srt"), "C\\:\\\\jobs\\\\subs.srt");
        assert_eq!(escape_filter_path("/it's,here"), "/it\\'s\\,here");
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 18"));
        assert!(tail.ends_with("line 29"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_media_error() {
        let media = FfmpegMedia::new("/nonexistent/ffmpeg");
        let result = media
            .extract_audio(Path::new("in.mp4"), Path::new("out.wav"))
            .await;
        match result {
            Err(VideoError::Media(msg)) => assert!(msg.contains("Failed to spawn ffmpeg")),
            other => panic!("expected Media error, got {:?}", other),
        }
    }
}
