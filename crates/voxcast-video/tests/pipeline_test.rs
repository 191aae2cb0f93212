use std::sync::Arc;
use voxcast_types::TranscriptSegment;
use voxcast_video::mock::{MockMedia, MockTranscriber};
use voxcast_video::{JobPaths, VideoError, VideoPipeline};

fn job_dir() -> (tempfile::TempDir, JobPaths) {
    let dir = tempfile::tempdir().unwrap();
    let paths = JobPaths::new(dir.path().join("job"));
    std::fs::create_dir_all(&paths.dir).unwrap();
    std::fs::write(&paths.input, b"fake mp4 bytes").unwrap();
    (dir, paths)
}

fn pipeline(media: Arc<MockMedia>, transcriber: Arc<MockTranscriber>) -> VideoPipeline {
    VideoPipeline::new(media.clone(), transcriber, media)
}

#[tokio::test]
async fn produces_every_artifact_in_the_job_directory() {
    let (_tmp, paths) = job_dir();
    let transcriber = Arc::new(MockTranscriber::new(vec![
        TranscriptSegment::new(0.0, 1.5, " Hello"),
        TranscriptSegment::new(1.5, 3.25, "world "),
    ]));
    let media = Arc::new(MockMedia::new());

    let output = pipeline(media.clone(), transcriber.clone())
        .run(&paths, "en")
        .await
        .unwrap();

    assert_eq!(output, paths.output);
    assert!(paths.audio.exists());
    assert_eq!(std::fs::read(&paths.output).unwrap(), b"fake mp4 bytes");

    let srt = std::fs::read_to_string(&paths.subtitles).unwrap();
    assert_eq!(
        srt,
        "1\n00:00:00,000 --> 00:00:01,500\nHello\n\n2\n00:00:01,500 --> 00:00:03,250\nworld\n\n"
    );
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(media.burns(), 1);
}

#[tokio::test]
async fn silent_video_still_gets_an_output() {
    let (_tmp, paths) = job_dir();
    let media = Arc::new(MockMedia::new());

    pipeline(media, Arc::new(MockTranscriber::new(Vec::new())))
        .run(&paths, "de")
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&paths.subtitles).unwrap(), "");
    assert!(paths.output.exists());
}

#[tokio::test]
async fn transcription_failure_stops_before_burning() {
    let (_tmp, paths) = job_dir();
    let media = Arc::new(MockMedia::new());

    let err = pipeline(media.clone(), Arc::new(MockTranscriber::failing()))
        .run(&paths, "en")
        .await
        .unwrap_err();

    assert!(matches!(err, VideoError::Transcription(_)));
    assert_eq!(media.burns(), 0);
    assert!(!paths.subtitles.exists());
    assert!(!paths.output.exists());
}

#[tokio::test]
async fn burn_failure_leaves_no_output() {
    let (_tmp, paths) = job_dir();
    let media = Arc::new(MockMedia::failing_burn());

    let err = pipeline(media, Arc::new(MockTranscriber::new(Vec::new())))
        .run(&paths, "en")
        .await
        .unwrap_err();

    assert!(matches!(err, VideoError::Media(_)));
    assert!(!paths.output.exists());
}
