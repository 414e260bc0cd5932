//! Quotex Trading Gateway API Server
//!
//! HTTP facade over the upstream broker session: balances, assets,
//! historical candles, and pass-through trades.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gateway_core::SessionApi;
use gateway_quotex::{QuotexConfig, QuotexSession, SampleSession};
use gateway_services::{ConnectionManager, FetcherConfig, KeepAlive, ProgressiveFetcher};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ConnectionManager<dyn SessionApi>>,
    pub fetcher: Arc<ProgressiveFetcher>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gateway_api=debug")),
        )
        .init();

    info!("Starting Quotex Trading Gateway API");

    // Build the session factory for the selected mode. The session itself is
    // constructed lazily by the connection manager on first use.
    let mode = std::env::var("GATEWAY_MODE").unwrap_or_else(|_| "live".to_string());
    let manager: Arc<ConnectionManager<dyn SessionApi>> = if mode.eq_ignore_ascii_case("sample") {
        info!("Running in sample mode - candles are synthetic, trading is disabled");
        Arc::new(ConnectionManager::new(Box::new(|| {
            Arc::new(SampleSession::new()) as Arc<dyn SessionApi>
        })))
    } else {
        let config = QuotexConfig::from_env()?;
        info!("Running in live mode against {}", config.ws_url);
        Arc::new(ConnectionManager::new(Box::new(move || {
            Arc::new(QuotexSession::new(config.clone())) as Arc<dyn SessionApi>
        })))
    };

    // One token fans out to the keep-alive loop and in-flight fetches.
    let shutdown = CancellationToken::new();

    let fetcher = Arc::new(ProgressiveFetcher::new(
        FetcherConfig::default(),
        shutdown.clone(),
    ));

    // Background keep-alive probe
    let keepalive = KeepAlive::new(Arc::clone(&manager));
    tokio::spawn(keepalive.run(shutdown.clone()));

    // Try initial connection; the server still starts if the upstream is
    // down, and the next request retries.
    if let Err(e) = manager.ensure_connected().await {
        warn!("Initial connection failed: {}", e);
    }

    let state = AppState {
        manager: Arc::clone(&manager),
        fetcher,
    };

    // Configure CORS for frontends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Build router
    let app = Router::new()
        .merge(routes::api_routes())
        .layer(cors)
        .with_state(state);

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    // Stop the background loop and close the session exactly once.
    shutdown.cancel();
    manager.shutdown().await;
    info!("Gateway stopped");

    Ok(())
}
