use std::path::PathBuf;
use thiserror::Error;
use voxcast_types::ProfileError;

#[derive(Error, Debug)]
pub enum SpeechError {
    /// A model or index file required at startup is absent.
    #[error("required artifact missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// The TTS engine finished without emitting a single chunk.
    #[error("TTS produced no audio")]
    EmptyOutput,

    /// Voice conversion returned nothing usable.
    #[error("voice conversion failed: {0}")]
    Conversion(String),

    #[error("TTS engine error: {0}")]
    Engine(String),

    #[error("voice profile not found: {0}")]
    ProfileNotFound(String),

    #[error("invalid voice profile: {0}")]
    Profile(#[from] ProfileError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}
