//! Pass-through trade placement

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use crate::routes::error_response;
use crate::AppState;
use gateway_core::OrderRequest;

#[derive(Debug, Serialize)]
struct TradeResponse {
    status: String,
    trade_id: String,
    details: serde_json::Value,
}

/// Place a trade (buy option)
async fn place_trade(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    info!(
        asset = %request.asset,
        amount = request.amount,
        direction = request.direction.as_str(),
        "Placing trade"
    );

    match session.place_order(&request).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(TradeResponse {
                status: "success".to_string(),
                trade_id: receipt.order_id,
                details: receipt.details,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error placing trade: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Create trading routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/trade", post(place_trade))
}
