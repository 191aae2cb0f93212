//! voxcast server binary.
//!
//! Loads configuration, prepares the job database, builds the worker
//! context (refusing to start if a model artifact is missing), starts the
//! video workers and serves HTTP until SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use voxcast_server::config::{self, Config};
use voxcast_server::context::WorkerContext;
use voxcast_server::{app, AppState};
use voxcast_video::{DispatchSettings, JobDispatcher, JobStore};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("VOXCAST_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    init_tracing(&config);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let pool = voxcast_db::create_pool(
        &config.database.path,
        voxcast_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool; check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied = voxcast_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
        let interrupted = voxcast_db::fail_interrupted_jobs(&conn)
            .expect("failed to close out interrupted jobs");
        if interrupted > 0 {
            tracing::warn!(count = interrupted, "marked jobs interrupted by restart as failed");
        }
    }

    let context = match WorkerContext::build(&config) {
        Ok(context) => Arc::new(context),
        Err(e) => {
            tracing::error!(error = %e, "worker context could not be built; refusing to serve");
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&config.video.jobs_root)
        .expect("failed to create video.jobs_root");
    let store = JobStore::new(&config.video.jobs_root, pool);
    let jobs = JobDispatcher::start(
        store,
        context.video.clone(),
        DispatchSettings {
            queue_capacity: config.video.queue_capacity,
            workers: config.video.workers,
            timeout: Duration::from_secs(config.video.timeout_secs),
        },
        Arc::clone(&context.gpu),
    );

    let state = AppState {
        context,
        jobs,
        max_upload_bytes: config.video.max_upload_bytes,
        cors_origins: config.server.cors_origins.clone(),
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting voxcast server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("voxcast server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
