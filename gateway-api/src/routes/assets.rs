//! Instrument listing and status endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use crate::routes::error_response;
use crate::AppState;
use gateway_core::{AssetInfo, GatewayError};

#[derive(Debug, Serialize)]
struct AssetsResponse {
    count: usize,
    assets: Vec<AssetInfo>,
}

#[derive(Debug, Serialize)]
struct AssetStatusResponse {
    asset: String,
    is_open: bool,
}

#[derive(Debug, Serialize)]
struct PaymentResponse {
    asset: String,
    payout: f64,
    is_open: bool,
}

/// List all instruments known to the session
async fn list_assets(State(state): State<AppState>) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    match session.assets().await {
        Ok(assets) => (
            StatusCode::OK,
            Json(AssetsResponse {
                count: assets.len(),
                assets,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error getting assets: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Check whether one instrument is open for trading
async fn asset_status(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    let assets = match session.assets().await {
        Ok(assets) => assets,
        Err(e) => {
            error!("Error checking asset status: {}", e);
            return error_response(&e).into_response();
        }
    };

    match assets.into_iter().find(|a| a.name == asset) {
        Some(info) => (
            StatusCode::OK,
            Json(AssetStatusResponse {
                asset: info.name,
                is_open: info.is_open,
            }),
        )
            .into_response(),
        None => error_response(&GatewayError::not_found(format!("Asset not found: {asset}")))
            .into_response(),
    }
}

/// Get payout information for one instrument
async fn payment_info(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    let assets = match session.assets().await {
        Ok(assets) => assets,
        Err(e) => {
            error!("Error getting payment info: {}", e);
            return error_response(&e).into_response();
        }
    };

    match assets.into_iter().find(|a| a.name == asset) {
        Some(info) => (
            StatusCode::OK,
            Json(PaymentResponse {
                asset: info.name,
                payout: info.payout,
                is_open: info.is_open,
            }),
        )
            .into_response(),
        None => error_response(&GatewayError::not_found(format!("Asset not found: {asset}")))
            .into_response(),
    }
}

/// Create asset routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assets", get(list_assets))
        .route("/assets/{asset}/status", get(asset_status))
        .route("/payment/{asset}", get(payment_info))
}
