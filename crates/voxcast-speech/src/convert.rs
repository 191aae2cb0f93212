//! Voice conversion: re-rendering audio in a registered voice.

use crate::artifacts::ensure_artifacts;
use crate::error::SpeechError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use voxcast_types::VoiceProfile;

const DEFAULT_CONVERT_TIMEOUT: Duration = Duration::from_secs(600);

/// Re-renders an audio file using the profile registered under `tag`.
#[async_trait]
pub trait VoiceConverter: Send + Sync {
    /// Returns the converted files written under `output_dir`. An empty
    /// list means the converter produced no result.
    async fn convert(
        &self,
        input: &Path,
        tag: &str,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, SpeechError>;
}

/// RVC inference driven as a subprocess.
///
/// Profiles are registered once in [`RvcConverter::new`]; the registry has
/// no mutating methods afterwards.
#[derive(Debug, Clone)]
pub struct RvcConverter {
    binary: PathBuf,
    profiles: HashMap<String, VoiceProfile>,
    timeout: Duration,
}

impl RvcConverter {
    /// Validates and registers `profiles`.
    ///
    /// Fails with [`SpeechError::MissingArtifact`] if any profile's model or
    /// index file is absent, so a misconfigured worker never starts serving.
    pub fn new(
        binary: impl AsRef<Path>,
        profiles: impl IntoIterator<Item = VoiceProfile>,
    ) -> Result<Self, SpeechError> {
        let mut registry = HashMap::new();
        for profile in profiles {
            profile.validate()?;
            ensure_artifacts(&[&profile.model_path, &profile.index_path])?;
            tracing::info!(
                tag = %profile.tag,
                model = %profile.model_path.display(),
                pitch_algo = %profile.pitch_algo,
                pitch_level = profile.pitch_level,
                "registered voice profile"
            );
            if let Some(previous) = registry.insert(profile.tag.clone(), profile) {
                return Err(SpeechError::Config(format!(
                    "duplicate voice profile tag: {}",
                    previous.tag
                )));
            }
        }

        Ok(Self {
            binary: binary.as_ref().to_path_buf(),
            profiles: registry,
            timeout: DEFAULT_CONVERT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn profile(&self, tag: &str) -> Option<&VoiceProfile> {
        self.profiles.get(tag)
    }

    fn command(&self, profile: &VoiceProfile, input: &Path, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--model")
            .arg(&profile.model_path)
            .arg("--index")
            .arg(&profile.index_path)
            .arg("--pitch-algo")
            .arg(profile.pitch_algo.as_str())
            .arg("--pitch-level")
            .arg(profile.pitch_level.to_string())
            .arg("--output-dir")
            .arg(output_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// Every non-blank stdout line names one converted file.
fn parse_output_paths(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[async_trait]
impl VoiceConverter for RvcConverter {
    async fn convert(
        &self,
        input: &Path,
        tag: &str,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, SpeechError> {
        let profile = self
            .profile(tag)
            .ok_or_else(|| SpeechError::ProfileNotFound(tag.to_string()))?;

        let child = self
            .command(profile, input, output_dir)
            .spawn()
            .map_err(|e| SpeechError::Conversion(format!("Failed to spawn rvc: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                SpeechError::Conversion(format!(
                    "RVC process timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| SpeechError::Conversion(format!("Failed to wait for rvc: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Conversion(format!(
                "RVC failed: {}",
                stderr.trim()
            )));
        }

        let paths = parse_output_paths(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(tag, outputs = paths.len(), "rvc conversion finished");
        Ok(paths)
    }
}
