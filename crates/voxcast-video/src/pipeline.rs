use crate::error::VideoError;
use crate::media::{AudioExtractor, SubtitleBurner};
use crate::store::JobPaths;
use crate::subtitles::write_srt;
use crate::transcribe::Transcriber;
use std::path::PathBuf;
use std::sync::Arc;

/// Extract, transcribe, render and burn, in that order.
#[derive(Clone)]
pub struct VideoPipeline {
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
    burner: Arc<dyn SubtitleBurner>,
}

impl VideoPipeline {
    pub fn new(
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        burner: Arc<dyn SubtitleBurner>,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            burner,
        }
    }

    /// Runs every step for the job in `paths` and returns the subtitled
    /// video's path.
    pub async fn run(&self, paths: &JobPaths, target_lang: &str) -> Result<PathBuf, VideoError> {
        self.extractor
            .extract_audio(&paths.input, &paths.audio)
            .await?;
        tracing::debug!(audio = %paths.audio.display(), "audio extracted");

        let segments = self
            .transcriber
            .transcribe(&paths.audio, target_lang)
            .await?;
        if segments.is_empty() {
            tracing::warn!(dir = %paths.dir.display(), "no speech found; burning empty subtitles");
        }

        write_srt(&paths.subtitles, &segments).await?;

        self.burner
            .burn_subtitles(&paths.input, &paths.subtitles, &paths.output)
            .await?;

        if !tokio::fs::try_exists(&paths.output).await? {
            return Err(VideoError::Media(format!(
                "{} was not produced",
                paths.output.display()
            )));
        }

        Ok(paths.output.clone())
    }
}
