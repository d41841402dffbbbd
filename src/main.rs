#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use std::sync::Arc;

use cerberus::api::{AppState, routes};
use cerberus::config::AppConfig;
use cerberus::remote::storage::{DashMapSessionDirectory, SessionDirectory};
use dotenv::dotenv;
use futures::future::join_all;
use poem::{Server, listener::TcpListener};
use tracing::{info, warn};

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Disconnect every session still in the directory.
async fn close_sessions(directory: &dyn SessionDirectory) {
    let sessions = directory.drain();
    if sessions.is_empty() {
        return;
    }

    info!("Closing {} remaining session(s)", sessions.len());
    join_all(sessions.iter().map(|session| async move {
        if let Err(e) = session.shell().disconnect().await {
            warn!("Failed to disconnect session {}: {}", session.id, e);
        }
    }))
    .await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Initialize logging with proper tracing default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let config = AppConfig::from_env();
    let addr = config.listen_addr();
    let shutdown_timeout = config.shutdown_timeout;

    let directory: Arc<dyn SessionDirectory> = Arc::new(DashMapSessionDirectory::new());
    let app = routes(AppState::new(config, directory.clone()));

    info!("Starting Cerberus API on {}", addr);

    Server::new(TcpListener::bind(addr))
        .name("Cerberus")
        .run_with_graceful_shutdown(app, shutdown_signal(), Some(shutdown_timeout))
        .await?;

    close_sessions(directory.as_ref()).await;
    info!("Server stopped");

    Ok(())
}
