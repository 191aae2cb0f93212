//! SubRip (`.srt`) rendering.

use crate::error::VideoError;
use std::fmt::Write as _;
use std::path::Path;
use voxcast_types::TranscriptSegment;

/// Formats seconds as `HH:MM:SS,mmm`.
///
/// The sub-second part is truncated to whole milliseconds, never rounded
/// up. The input is first snapped to the nearest microsecond so that
/// values like `3599.999`, which are stored as `3599.99899999…`, keep
/// their written millisecond. Negative and non-finite inputs format as
/// zero.
pub fn format_srt_timestamp(seconds: f64) -> String {
    let micros = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1_000_000.0).round() as u64
    } else {
        0
    };
    let total_ms = micros / 1_000;

    let ms = total_ms % 1_000;
    let total_secs = total_ms / 1_000;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3_600;

    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Renders segments as numbered SRT cues, in the order given.
pub fn render_srt(segments: &[TranscriptSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            segment.text.trim()
        );
    }
    out
}

pub async fn write_srt(path: &Path, segments: &[TranscriptSegment]) -> Result<(), VideoError> {
    tokio::fs::write(path, render_srt(segments)).await?;
    tracing::debug!(path = %path.display(), cues = segments.len(), "subtitles written");
    Ok(())
}
