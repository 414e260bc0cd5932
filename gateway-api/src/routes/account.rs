//! Profile and balance endpoints (straight delegation to the session)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::error;

use crate::routes::error_response;
use crate::AppState;
use gateway_core::AccountType;

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    #[serde(default)]
    pub account_type: AccountType,
}

/// Get user profile information
async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    match session.profile().await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => {
            error!("Error getting profile: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Get account balance
async fn get_balance(
    State(state): State<AppState>,
    Query(params): Query<BalanceQuery>,
) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    match session.balance(params.account_type).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(e) => {
            error!("Error getting balance: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Create account routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/balance", get(get_balance))
}
