mod api;
mod auth;
mod config;
mod openapi;
mod state;
mod store;
#[cfg(test)]
mod test_utils;
mod upstream;

use crate::state::AppState;
use axum::Router;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load configuration
    let config = match config::GatewayConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if config.member_list().is_empty() {
        warn!(
            "GATEWAY_ALLOWED_MEMBERS is empty: the member gate is disabled and \
             every authenticated upstream user will be admitted"
        );
    }

    // Initialize application state
    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            std::process::exit(1);
        }
    };

    // Reap expired authorization codes and abandoned pending logins
    store::spawn_sweeper(
        state.store.clone(),
        Duration::from_secs(state.config.store.sweep_interval_secs),
    );

    // Create application
    let app = create_app(state.clone()).await;

    // Build server address
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));

    // Start server
    let server = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Gateway running on {}, press Ctrl+C to stop", addr);
    let serve = axum::serve(server, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = serve {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Gateway shutdown complete");
}

/// Create a new application instance with a given state
pub async fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(api::router())
        .merge(Scalar::with_url("/scalar", openapi::ApiDoc::openapi()))
        .with_state(state)
}

// Simple signal handler that works on all platforms
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
