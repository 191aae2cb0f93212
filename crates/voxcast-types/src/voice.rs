//! Voice conversion profile definitions.
//!
//! A `VoiceProfile` binds a tag to a trained RVC model, its feature index,
//! and the pitch settings used when re-rendering audio in that voice.
//! Profiles are loaded once at startup and never change afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Largest accepted pitch shift, in semitones, in either direction.
pub const MAX_PITCH_LEVEL: i32 = 24;

/// Pitch extraction algorithms understood by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PitchAlgorithm {
    #[serde(rename = "pm")]
    Pm,
    #[serde(rename = "harvest")]
    Harvest,
    #[serde(rename = "crepe")]
    Crepe,
    #[serde(rename = "rmvpe")]
    Rmvpe,
    /// RMVPE with the converter's extra smoothing pass.
    #[default]
    #[serde(rename = "rmvpe+")]
    RmvpePlus,
}

impl PitchAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pm => "pm",
            Self::Harvest => "harvest",
            Self::Crepe => "crepe",
            Self::Rmvpe => "rmvpe",
            Self::RmvpePlus => "rmvpe+",
        }
    }
}

impl fmt::Display for PitchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PitchAlgorithm {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pm" => Ok(Self::Pm),
            "harvest" => Ok(Self::Harvest),
            "crepe" => Ok(Self::Crepe),
            "rmvpe" => Ok(Self::Rmvpe),
            "rmvpe+" => Ok(Self::RmvpePlus),
            other => Err(ProfileError::UnknownPitchAlgorithm(other.to_string())),
        }
    }
}

/// Errors raised while validating a profile definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile tag must not be empty")]
    EmptyTag,

    #[error("unknown pitch algorithm: {0}")]
    UnknownPitchAlgorithm(String),

    #[error("pitch level {0} outside -24..=24")]
    PitchLevelOutOfRange(i32),
}

/// A named voice conversion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Tag requests use to select this profile.
    pub tag: String,
    /// Path to the trained model weights (`.pth`).
    pub model_path: PathBuf,
    /// Path to the feature retrieval index (`.index`).
    pub index_path: PathBuf,
    #[serde(default)]
    pub pitch_algo: PitchAlgorithm,
    /// Pitch shift in semitones.
    #[serde(default)]
    pub pitch_level: i32,
}

impl VoiceProfile {
    pub fn new(
        tag: impl Into<String>,
        model_path: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tag: tag.into(),
            model_path: model_path.into(),
            index_path: index_path.into(),
            pitch_algo: PitchAlgorithm::default(),
            pitch_level: 0,
        }
    }

    /// Checks the fields that can be validated without touching the disk.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.tag.trim().is_empty() {
            return Err(ProfileError::EmptyTag);
        }
        if !(-MAX_PITCH_LEVEL..=MAX_PITCH_LEVEL).contains(&self.pitch_level) {
            return Err(ProfileError::PitchLevelOutOfRange(self.pitch_level));
        }
        Ok(())
    }
}
