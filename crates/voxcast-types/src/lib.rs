//! Shared types for the voxcast workspace.
//!
//! This crate holds the data model that both request pipelines and the
//! HTTP layer agree on: audio buffers, voice conversion profiles,
//! transcript segments, and video job identifiers and states.
//!
//! Nothing here performs I/O. Engines, persistence and the HTTP surface
//! live in the crates that depend on this one.

mod audio;
mod job;
mod transcript;
pub mod voice;

pub use audio::AudioBuffer;
pub use job::{JobId, JobStatus, ParseJobStatusError};
pub use transcript::TranscriptSegment;
pub use voice::{PitchAlgorithm, ProfileError, VoiceProfile};

/// Sample rate of synthesized speech, in Hz.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Sample rate of audio extracted from uploaded video, in Hz.
pub const VIDEO_AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Language used when a video request does not name one.
pub const DEFAULT_TARGET_LANG: &str = "en";
