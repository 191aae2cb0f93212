use std::fs;
use voxcast_server::config::{Config, TranscriberBackend};
use voxcast_server::context::{ContextError, WorkerContext};
use voxcast_speech::SpeechError;

fn config_in(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.models_dir = dir.to_path_buf();
    config.transcriber.backend = TranscriberBackend::Openai;
    config
}

fn touch(dir: &std::path::Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), b"weights").unwrap();
    }
}

#[test]
fn missing_profile_model_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["hubert_base.pt", "rmvpe.pt", "myvoice.index"]);

    match WorkerContext::build(&config_in(dir.path())) {
        Err(ContextError::Speech(SpeechError::MissingArtifact(path))) => {
            assert_eq!(path, dir.path().join("myvoice.pth"));
        }
        Err(other) => panic!("expected missing artifact, got {other}"),
        Ok(_) => panic!("context must not build without the model"),
    }
}

#[test]
fn missing_required_artifact_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["hubert_base.pt", "myvoice.pth", "myvoice.index"]);

    let result = WorkerContext::build(&config_in(dir.path()));
    assert!(matches!(
        result,
        Err(ContextError::Speech(SpeechError::MissingArtifact(ref p))) if p.ends_with("rmvpe.pt")
    ));
}

#[test]
fn missing_whisper_model_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    touch(
        dir.path(),
        &["hubert_base.pt", "rmvpe.pt", "myvoice.pth", "myvoice.index"],
    );
    let mut config = config_in(dir.path());
    config.transcriber.backend = TranscriberBackend::WhisperCli;

    assert!(matches!(
        WorkerContext::build(&config),
        Err(ContextError::Speech(SpeechError::MissingArtifact(_)))
    ));
}

#[tokio::test]
async fn complete_model_directory_builds() {
    let dir = tempfile::tempdir().unwrap();
    touch(
        dir.path(),
        &["hubert_base.pt", "rmvpe.pt", "myvoice.pth", "myvoice.index"],
    );

    let context = WorkerContext::build(&config_in(dir.path())).unwrap();
    assert_eq!(context.speech.profile_tag(), "custom");
    assert_eq!(context.gpu.available_permits(), 1);
}

#[test]
fn zero_gpu_permits_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.gpu.max_concurrency = 0;

    assert!(matches!(
        WorkerContext::build(&config),
        Err(ContextError::Config(_))
    ));
}
