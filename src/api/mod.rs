//! HTTP API, WebSocket stream and dashboard
//!
//! This module exposes the ingestion service and the message queue over
//! HTTP, plus a WebSocket that pushes message status changes in real time.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Service and queue handles** shared through [`ApiState`]
//! - **WebSocket** fed by a message queue listener
//!
//! ## Endpoints
//!
//! - `GET /` - Dashboard page
//! - `GET /api/v1/health` - Health check
//! - `POST /vitals` - Ingest a reading
//! - `GET /vitals` - List readings (`?patient_id=`)
//! - `GET /alerts` - List alerts (`?patient_id=`)
//! - `GET /messages` - List patient messages
//! - `POST /messages` - Queue a patient message
//! - `WS /events` - Real-time message status updates

pub mod types;

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod websocket;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;

#[cfg(feature = "api")]
use axum::{Router, routing::get};
use std::net::SocketAddr;
#[cfg(feature = "api")]
use tokio::task::JoinHandle;
#[cfg(feature = "api")]
use tokio_util::sync::CancellationToken;
#[cfg(feature = "api")]
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:5000")
    pub bind_addr: SocketAddr,

    /// Enable CORS for the dashboard
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            enable_cors: true,
        }
    }
}

/// Build the router with all routes
#[cfg(feature = "api")]
pub fn router(state: ApiState, enable_cors: bool) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/", get(routes::dashboard::dashboard))
        .route("/api/v1/health", get(routes::health::health_check))
        .route(
            "/vitals",
            get(routes::vitals::list_vitals).post(routes::vitals::ingest_vital),
        )
        .route("/alerts", get(routes::alerts::list_alerts))
        .route(
            "/messages",
            get(routes::messages::list_messages).post(routes::messages::enqueue_message),
        )
        .route("/events", get(websocket::websocket_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task that shuts down
/// gracefully once `shutdown` is cancelled. Returns the server's local
/// address and the task handle.
#[cfg(feature = "api")]
pub async fn spawn_api_server(
    config: ApiConfig,
    state: ApiState,
    shutdown: CancellationToken,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, config.enable_cors);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    // Spawn server in background
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((addr, handle))
}
