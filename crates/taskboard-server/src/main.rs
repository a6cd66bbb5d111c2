//! Taskboard backend server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use taskboard_server::{AppState, metrics, router};
use taskboard_settings::{load_settings, load_settings_from_path};
use taskboard_sse::{SseConfig, SseHub};
use taskboard_store::open_pool;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "taskboard-server", about = "Task tracking backend with real-time SSE")]
struct Args {
    /// Path to a JSON settings file. Omit to use defaults plus
    /// TASKBOARD_* environment overrides.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = match args.settings {
        Some(ref path) => load_settings_from_path(path)?,
        None => load_settings(),
    };
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    let settings = Arc::new(settings);

    let metrics_handle = metrics::install_recorder();
    let pool = open_pool(&settings.database.path, settings.database.pool_size)?;

    let hub = Arc::new(SseHub::new(SseConfig {
        heartbeat_interval: Duration::from_secs(settings.sse.heartbeat_interval_secs),
        cleanup_interval: Duration::from_secs(settings.sse.cleanup_interval_secs),
        max_connections: settings.sse.max_connections,
    }));
    hub.start();

    let state = AppState::new(pool, Arc::clone(&hub), Arc::clone(&settings), metrics_handle);
    let app = router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, service = %settings.name, "taskboard server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub.stop().await;
    info!("shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                let _ = signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
