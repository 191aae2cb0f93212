use std::sync::Arc;
use voxcast_speech::mock::{ConverterBehavior, MockConverter, MockTts};
use voxcast_speech::wav::inspect_wav;
use voxcast_speech::{SpeechError, SpeechPipeline, VoiceSelector};

fn pipeline(tts: Arc<MockTts>, converter: Arc<MockConverter>) -> SpeechPipeline {
    SpeechPipeline::new(tts, converter, VoiceSelector::default(), "custom")
}

#[tokio::test]
async fn pipeline_returns_wav_at_speech_rate() {
    let tts = Arc::new(MockTts::new(vec![vec![0.1; 240], vec![0.2; 480]]));
    let converter = Arc::new(MockConverter::passthrough());

    let bytes = pipeline(tts.clone(), converter.clone())
        .run("Hello there")
        .await
        .expect("pipeline should succeed");

    let spec = inspect_wav(&bytes).unwrap();
    assert_eq!(spec.sample_rate, 24_000);
    assert_eq!(spec.channels, 1);
    assert_eq!(tts.calls(), 1);
    assert_eq!(converter.calls(), 1);
}

#[tokio::test]
async fn chunks_keep_their_order() {
    let a = vec![0.1, 0.2];
    let b = vec![0.3];
    let c = vec![0.4, 0.5];
    let tts = Arc::new(MockTts::new(vec![a.clone(), b.clone(), c.clone()]));

    let buffer = pipeline(tts, Arc::new(MockConverter::passthrough()))
        .synthesize("abc")
        .await
        .unwrap();

    let expected: Vec<f32> = a.into_iter().chain(b).chain(c).collect();
    assert_eq!(buffer.samples(), expected.as_slice());
}

#[tokio::test]
async fn no_chunks_is_empty_output() {
    let converter = Arc::new(MockConverter::passthrough());
    let result = pipeline(Arc::new(MockTts::silent()), converter.clone())
        .run("")
        .await;

    assert!(matches!(result, Err(SpeechError::EmptyOutput)), "got {:?}", result);
    assert_eq!(converter.calls(), 0, "conversion must not run without audio");
}

#[tokio::test]
async fn empty_conversion_result_is_conversion_error() {
    let tts = Arc::new(MockTts::new(vec![vec![0.0; 10]]));
    let converter = Arc::new(MockConverter::new(ConverterBehavior::Empty));

    let result = pipeline(tts, converter).run("Hello").await;
    assert!(matches!(result, Err(SpeechError::Conversion(_))), "got {:?}", result);
}

#[tokio::test]
async fn non_wav_conversion_is_conversion_error() {
    let tts = Arc::new(MockTts::new(vec![vec![0.0; 10]]));
    let converter = Arc::new(MockConverter::new(ConverterBehavior::Garbage));

    match pipeline(tts, converter).run("Hello").await {
        Err(SpeechError::Conversion(msg)) => assert!(msg.contains("not WAV"), "got: {}", msg),
        other => panic!("expected Conversion error, got {:?}", other),
    }
}

#[tokio::test]
async fn scratch_directory_is_removed_after_run() {
    let root = tempfile::tempdir().unwrap();
    let tts = Arc::new(MockTts::new(vec![vec![0.0; 10]]));

    pipeline(tts, Arc::new(MockConverter::passthrough()))
        .with_scratch_root(root.path())
        .run("Hello")
        .await
        .unwrap();

    let leftovers = std::fs::read_dir(root.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}
