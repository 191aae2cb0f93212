//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use voxcast_types::VoiceProfile;
use voxcast_video::TranscribeTask;

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory that relative model and artifact paths are resolved against.
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub gpu: GpuConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub transcriber: TranscriberConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database holding job state.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voxcast_video=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpuConfig {
    /// Pipeline runs allowed on the GPU at once, across speech and video.
    #[serde(default = "default_gpu_concurrency")]
    pub max_concurrency: usize,
}

/// TTS engine, voice conversion, and the artifacts both need.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_tts_binary")]
    pub engine_binary: PathBuf,

    /// Kokoro language code (`a` is American English).
    #[serde(default = "default_lang_code")]
    pub lang_code: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Wall-clock limit for one `/tts` request.
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_converter_binary")]
    pub converter_binary: PathBuf,

    #[serde(default = "default_profile")]
    pub profile: VoiceProfile,

    /// Files the converter loads besides the profile (feature extractor,
    /// pitch model). Startup fails if any is missing.
    #[serde(default = "default_required_artifacts")]
    pub required_artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: PathBuf,

    #[serde(default = "default_jobs_root")]
    pub jobs_root: PathBuf,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Wall-clock limit for one job's pipeline run.
    #[serde(default = "default_video_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriberBackend {
    #[default]
    WhisperCli,
    Openai,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriberConfig {
    #[serde(default)]
    pub backend: TranscriberBackend,

    #[serde(default)]
    pub task: TranscribeTask,

    /// Model name sent to the HTTP backend.
    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// ggml model file for the CLI backend.
    #[serde(default = "default_whisper_model_path")]
    pub model_path: PathBuf,

    #[serde(default = "default_whisper_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_whisper_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("/models")
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    "voxcast.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gpu_concurrency() -> usize {
    1
}

fn default_tts_binary() -> PathBuf {
    PathBuf::from("kokoro-tts")
}

fn default_lang_code() -> String {
    "a".to_string()
}

fn default_voice() -> String {
    "af_heart".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_speech_timeout_secs() -> u64 {
    900
}

fn default_converter_binary() -> PathBuf {
    PathBuf::from("rvc-infer")
}

fn default_profile() -> VoiceProfile {
    VoiceProfile::new("custom", "myvoice.pth", "myvoice.index")
}

fn default_required_artifacts() -> Vec<PathBuf> {
    vec![PathBuf::from("hubert_base.pt"), PathBuf::from("rmvpe.pt")]
}

fn default_ffmpeg_binary() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_jobs_root() -> PathBuf {
    PathBuf::from("/data/videos/jobs")
}

fn default_queue_capacity() -> usize {
    16
}

fn default_workers() -> usize {
    1
}

fn default_video_timeout_secs() -> u64 {
    1800
}

fn default_max_upload_bytes() -> usize {
    512 * 1024 * 1024
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_whisper_model_path() -> PathBuf {
    PathBuf::from("ggml-medium.bin")
}

fn default_whisper_binary() -> PathBuf {
    PathBuf::from("whisper-cli")
}

fn default_whisper_base_url() -> String {
    "http://127.0.0.1:8080/v1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            gpu: GpuConfig::default(),
            speech: SpeechConfig::default(),
            video: VideoConfig::default(),
            transcriber: TranscriberConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_gpu_concurrency(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine_binary: default_tts_binary(),
            lang_code: default_lang_code(),
            voice: default_voice(),
            speed: default_speed(),
            timeout_secs: default_speech_timeout_secs(),
            converter_binary: default_converter_binary(),
            profile: default_profile(),
            required_artifacts: default_required_artifacts(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: default_ffmpeg_binary(),
            jobs_root: default_jobs_root(),
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
            timeout_secs: default_video_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            backend: TranscriberBackend::default(),
            task: TranscribeTask::default(),
            model: default_whisper_model(),
            model_path: default_whisper_model_path(),
            binary: default_whisper_binary(),
            base_url: default_whisper_base_url(),
            api_key: None,
        }
    }
}

impl Config {
    /// Joins a relative artifact path onto `models_dir`.
    pub fn model_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.models_dir.join(path)
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VOXCAST_HOST` overrides `server.host`
/// - `VOXCAST_PORT` overrides `server.port`
/// - `VOXCAST_DB_PATH` overrides `database.path`
/// - `VOXCAST_LOG_LEVEL` overrides `logging.level`
/// - `VOXCAST_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `VOXCAST_JOBS_ROOT` overrides `video.jobs_root`
/// - `VOXCAST_MODELS_DIR` overrides `models_dir`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("VOXCAST_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("VOXCAST_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = var("VOXCAST_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("VOXCAST_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("VOXCAST_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(root) = var("VOXCAST_JOBS_ROOT") {
        config.video.jobs_root = PathBuf::from(root);
    }
    if let Some(dir) = var("VOXCAST_MODELS_DIR") {
        config.models_dir = PathBuf::from(dir);
    }
}
