use serde::{Deserialize, Serialize};

/// A timestamped span of transcribed (or translated) text.
///
/// Times are in seconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Sorts segments by start time. Overlaps are left as they are.
    pub fn sort_by_start(segments: &mut [TranscriptSegment]) {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    }
}
