//! Service banner, connection status, and manual connect endpoints

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, routing::post, Json,
    Router,
};
use serde::Serialize;
use tracing::info;

use crate::routes::error_response;
use crate::AppState;

/// Banner returned from the root path
#[derive(Debug, Serialize)]
struct RootResponse {
    status: String,
    service: String,
    version: String,
    connected: bool,
}

/// Connection status projection
#[derive(Debug, Serialize)]
struct StatusResponse {
    connected: bool,
    last_error: Option<String>,
    last_connected: Option<String>,
    uptime_seconds: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ConnectResponse {
    status: String,
    message: String,
}

/// Health check handler
async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let status = state.manager.status().await;
    Json(RootResponse {
        status: "online".to_string(),
        service: "Quotex Trading Gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connected: status.connected,
    })
}

/// Get connection status
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.manager.status().await;
    Json(StatusResponse {
        connected: status.connected,
        uptime_seconds: status.uptime_secs(),
        last_connected: status.last_connected_at.map(|t| t.to_rfc3339()),
        last_error: status.last_error,
    })
}

/// Manually trigger a connect (or reconnect)
async fn connect(State(state): State<AppState>) -> impl IntoResponse {
    match state.manager.ensure_connected().await {
        Ok(_) => {
            info!("Manual connect succeeded");
            (
                StatusCode::OK,
                Json(ConnectResponse {
                    status: "connected".to_string(),
                    message: "Successfully connected to upstream".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/status", get(get_status))
        .route("/connect", post(connect))
}
