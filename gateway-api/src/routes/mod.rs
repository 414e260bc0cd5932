//! API route definitions

mod account;
mod assets;
mod candles;
mod health;
mod trading;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;

use crate::AppState;
use gateway_core::GatewayError;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(account::routes())
        .merge(candles::routes())
        .merge(assets::routes())
        .merge(trading::routes())
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a gateway error to its HTTP representation.
///
/// Connection-lifecycle failures mean the upstream is unreachable (503);
/// refused orders and malformed request parameters are the caller's problem
/// (400); everything else is ours (500).
pub fn error_response(err: &GatewayError) -> (StatusCode, Json<ErrorResponse>) {
    let code = match err {
        GatewayError::Connection(_) | GatewayError::Reconnection(_) | GatewayError::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::Rejected(_) | GatewayError::Invalid(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
