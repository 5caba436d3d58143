//! HTTP snapshot endpoint
//!
//! Read-only JSON views of the same data the console prints.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Historian handle** for tallies and report lines
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/conf` - Running configuration
//! - `GET /api/v1/history` - Tally of every target
//! - `GET /api/v1/report` - Summary lines
//! - `GET /api/v1/report/{target}` - Drill-down lines for one target

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{HealthResponse, LinesResponse};

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:9444")
    pub bind_addr: SocketAddr,

    /// Enable CORS for browser clients
    pub enable_cors: bool,
}

impl ApiConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            enable_cors: true,
        }
    }
}

/// Build the router with all routes
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/conf", get(routes::conf::get_conf))
        .route("/api/v1/history", get(routes::history::get_history))
        .route("/api/v1/report", get(routes::report::get_report))
        .route(
            "/api/v1/report/:target",
            get(routes::report::get_target_report),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let mut app = build_router(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {e}");
        }
    });

    Ok(addr)
}
