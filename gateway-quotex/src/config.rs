//! Session client configuration

use gateway_core::{GatewayError, GatewayResult};

/// Default websocket endpoint (engine.io v3 handshake).
const DEFAULT_WS_URL: &str = "wss://ws2.qxbroker.com/socket.io/?EIO=3&transport=websocket";

/// Configuration for [`QuotexSession`](crate::QuotexSession).
///
/// The broker authenticates websocket sessions with a browser-issued session
/// token; obtaining that token (interactive login) is outside the gateway,
/// so the token is supplied through the environment.
#[derive(Debug, Clone)]
pub struct QuotexConfig {
    /// Websocket endpoint URL.
    pub ws_url: String,
    /// Session token used in the authorization handshake.
    pub ssid: String,
    /// Whether to operate on the demo account by default.
    pub demo: bool,
    /// Reply timeout for request/response events, in seconds.
    pub reply_timeout_secs: u64,
}

impl QuotexConfig {
    /// Load from environment variables.
    ///
    /// `QUOTEX_SSID` is required; `QUOTEX_WS_URL` and `QUOTEX_DEMO` have
    /// defaults.
    pub fn from_env() -> GatewayResult<Self> {
        let ssid = std::env::var("QUOTEX_SSID")
            .map_err(|_| GatewayError::config("QUOTEX_SSID is not set"))?;
        if ssid.trim().is_empty() {
            return Err(GatewayError::config("QUOTEX_SSID is empty"));
        }

        let ws_url =
            std::env::var("QUOTEX_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());
        let demo = std::env::var("QUOTEX_DEMO")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Ok(Self {
            ws_url,
            ssid,
            demo,
            reply_timeout_secs: 10,
        })
    }
}
