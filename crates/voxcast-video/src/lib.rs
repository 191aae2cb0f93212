//! Video subtitle pipeline and job orchestration.
//!
//! A job takes an uploaded video through four steps, all writing into the
//! job's directory under the jobs root:
//!
//! 1. [`AudioExtractor`]: demux to mono 16 kHz `audio.wav`
//! 2. [`Transcriber`]: timestamped, optionally translated, segments
//! 3. [`subtitles`]: render `subs.srt`
//! 4. [`SubtitleBurner`]: burn the subtitles into `final.mp4`
//!
//! [`JobStore`] owns the directory layout and the persisted job state.
//! [`JobDispatcher`] feeds jobs through a bounded queue to a fixed number
//! of workers, each holding a GPU permit while its pipeline runs.

pub mod dispatch;
pub mod error;
pub mod media;
pub mod mock;
pub mod pipeline;
pub mod store;
pub mod subtitles;
pub mod transcribe;

pub use dispatch::{DispatchSettings, JobDispatcher};
pub use error::VideoError;
pub use media::{AudioExtractor, FfmpegMedia, SubtitleBurner};
pub use pipeline::VideoPipeline;
pub use store::{JobPaths, JobStore};
pub use transcribe::{
    validate_language, TranscribeTask, Transcriber, WhisperCliTranscriber,
    WhisperHttpTranscriber,
};
