//! Candle retrieval endpoints
//!
//! `/candles` is a single delegation call; `/candles/progressive` drives the
//! progressive fetcher to assemble a multi-day window.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::routes::error_response;
use crate::AppState;
use gateway_core::{Candle, FetchWindow};

#[derive(Debug, Deserialize)]
pub struct CandlesQuery {
    #[serde(default = "default_asset")]
    pub asset: String,
    #[serde(default = "default_period")]
    pub period: i64,
    #[serde(default = "default_offset")]
    pub offset: i64,
    /// End of the window, seconds since epoch. Defaults to now.
    pub end_time: Option<i64>,
}

/// Request body for a progressive fetch
#[derive(Debug, Deserialize)]
pub struct ProgressiveRequest {
    #[serde(default = "default_asset")]
    pub asset: String,
    #[serde(default = "default_period")]
    pub period: i64,
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default = "default_offset")]
    pub offset: i64,
}

fn default_asset() -> String {
    "EURUSD_otc".to_string()
}
fn default_period() -> i64 {
    60
}
fn default_days() -> i64 {
    1
}
fn default_offset() -> i64 {
    3600
}

#[derive(Debug, Serialize)]
struct CandlesResponse {
    asset: String,
    period: i64,
    count: usize,
    candles: Vec<Candle>,
}

#[derive(Debug, Serialize)]
struct ProgressiveResponse {
    asset: String,
    period: i64,
    days: i64,
    count: usize,
    candles: Vec<Candle>,
}

/// Get historical candles with a single retrieval call
async fn get_candles(
    State(state): State<AppState>,
    Query(params): Query<CandlesQuery>,
) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    let end_time = params.end_time.unwrap_or_else(|| Utc::now().timestamp());
    match session
        .get_candles(&params.asset, end_time, params.offset, params.period, false)
        .await
    {
        Ok(candles) => (
            StatusCode::OK,
            Json(CandlesResponse {
                asset: params.asset,
                period: params.period,
                count: candles.len(),
                candles,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error getting candles: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Usage hint for callers that GET the progressive endpoint
async fn progressive_usage() -> Json<serde_json::Value> {
    Json(json!({
        "message": "This endpoint requires a POST request",
        "method": "POST",
        "url": "/candles/progressive",
        "example_request": {
            "asset": "EURUSD_otc",
            "period": 60,
            "days": 1,
            "offset": 3600
        },
        "description": "Fetches progressive historical candle data for trading bots"
    }))
}

/// Assemble a multi-day candle window through the progressive fetcher
async fn get_candles_progressive(
    State(state): State<AppState>,
    Json(request): Json<ProgressiveRequest>,
) -> impl IntoResponse {
    let session = match state.manager.ensure_connected().await {
        Ok(session) => session,
        Err(e) => return error_response(&e).into_response(),
    };

    let window = FetchWindow {
        asset: request.asset.clone(),
        period_secs: request.period,
        days: request.days,
        offset_secs: request.offset,
    };

    info!(
        asset = %window.asset,
        days = window.days,
        "Progressive candle request"
    );

    match state.fetcher.fetch(session.as_ref(), &window).await {
        Ok(candles) => (
            StatusCode::OK,
            Json(ProgressiveResponse {
                asset: request.asset,
                period: request.period,
                days: request.days,
                count: candles.len(),
                candles,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error getting progressive candles: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Create candle routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/candles", get(get_candles))
        .route(
            "/candles/progressive",
            get(progressive_usage).post(get_candles_progressive),
        )
}
