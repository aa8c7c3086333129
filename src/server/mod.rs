//! HTTP front end: the board page, the update forms and a JSON view.

pub mod api;
pub mod page;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use axum::Router;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::ServerSection;
use crate::service::SprintBoard;

pub use api::{AppState, SharedState};

/// Configuration for the board server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow cross-origin requests, for a front end served elsewhere.
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServerSection::default())
    }
}

impl From<&ServerSection> for ServerConfig {
    fn from(section: &ServerSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            permissive_cors: false,
        }
    }
}

pub fn build_router(state: SharedState) -> Router {
    api::api_router().with_state(state)
}

/// Serve the board until Ctrl+C or a fatal error.
///
/// A fatal error (the project could not be persisted, or the tracker is
/// gone) stops the server and is returned, so the process exits non-zero.
pub async fn start_server(config: ServerConfig, board: SprintBoard) -> Result<()> {
    let state = Arc::new(AppState::new(board));
    let fatal = state.fatal.subscribe();

    let mut app = build_router(state);
    if config.permissive_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let local_addr = listener.local_addr()?;
    info!(%local_addr, "Sprint View listening");
    println!("Sprint View running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(fatal.clone()))
        .await
        .context("Server error")?;

    let reason = fatal.borrow().clone();
    if let Some(reason) = reason {
        bail!("Stopped after fatal error: {}", reason);
    }
    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal(mut fatal: watch::Receiver<Option<String>>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        println!("\nShutting down...");
    };
    let fatal_error = async move {
        while fatal.borrow_and_update().is_none() {
            if fatal.changed().await.is_err() {
                break;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = fatal_error => {}
    }
}
