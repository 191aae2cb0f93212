//! Video job identifiers and lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier of a video job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle of a video job.
///
/// `Created` on receipt, `Processing` once a worker owns it, then exactly
/// one of the terminal states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Created,
    Processing,
    Succeeded { output: PathBuf },
    Failed { reason: String },
}

impl JobStatus {
    /// Label used on the wire and in the `video_jobs.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Succeeded { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            Self::Succeeded { output } => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Rebuilds a status from its stored columns.
    pub fn from_parts(
        label: &str,
        output: Option<String>,
        error: Option<String>,
    ) -> Result<Self, ParseJobStatusError> {
        match label {
            "created" => Ok(Self::Created),
            "processing" => Ok(Self::Processing),
            "done" => output
                .map(|o| Self::Succeeded {
                    output: PathBuf::from(o),
                })
                .ok_or(ParseJobStatusError::MissingOutput),
            "failed" => Ok(Self::Failed {
                reason: error.unwrap_or_default(),
            }),
            other => Err(ParseJobStatusError::UnknownLabel(other.to_string())),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseJobStatusError {
    #[error("unknown job status: {0}")]
    UnknownLabel(String),

    #[error("job marked done without an output path")]
    MissingOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_parses_its_display_form() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(JobStatus::Created.as_str(), "created");
        assert_eq!(JobStatus::Processing.as_str(), "processing");
        assert_eq!(
            JobStatus::Succeeded {
                output: PathBuf::from("/data/final.mp4")
            }
            .as_str(),
            "done"
        );
        assert_eq!(
            JobStatus::Failed {
                reason: "boom".into()
            }
            .as_str(),
            "failed"
        );
    }

    #[test]
    fn from_parts_restores_terminal_states() {
        let done = JobStatus::from_parts("done", Some("/jobs/x/final.mp4".into()), None).unwrap();
        assert_eq!(done.output(), Some(&PathBuf::from("/jobs/x/final.mp4")));
        assert!(done.is_terminal());

        let failed = JobStatus::from_parts("failed", None, Some("ffmpeg exited 1".into())).unwrap();
        assert_eq!(failed.error(), Some("ffmpeg exited 1"));

        assert_eq!(
            JobStatus::from_parts("done", None, None),
            Err(ParseJobStatusError::MissingOutput)
        );
        assert!(matches!(
            JobStatus::from_parts("queued", None, None),
            Err(ParseJobStatusError::UnknownLabel(_))
        ));
        assert!(!JobStatus::Processing.is_terminal());
    }
}
