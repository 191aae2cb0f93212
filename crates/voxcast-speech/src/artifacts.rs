//! Startup checks for model files mounted from durable storage.

use crate::error::SpeechError;
use std::path::Path;

/// Fails with [`SpeechError::MissingArtifact`] on the first path that is
/// not an existing regular file.
pub fn ensure_artifacts<P: AsRef<Path>>(paths: &[P]) -> Result<(), SpeechError> {
    for path in paths {
        let path = path.as_ref();
        if !path.is_file() {
            tracing::error!(path = %path.display(), "required model artifact is missing");
            return Err(SpeechError::MissingArtifact(path.to_path_buf()));
        }
    }
    Ok(())
}
