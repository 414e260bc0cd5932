//! Session capability contract
//!
//! The gateway treats the upstream broker session as an injected capability:
//! everything the connection manager, the progressive fetcher, and the HTTP
//! routes need is expressed by [`SessionApi`]. Concrete implementations live
//! in `gateway-quotex`; tests substitute mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::candle::Candle;
use crate::error::GatewayResult;

/// Outcome of a connect attempt, as reported by the upstream.
///
/// A refused handshake is not a transport error: the socket worked, the
/// upstream said no. Transport failures surface as `Err` instead.
#[derive(Debug, Clone)]
pub struct ConnectAck {
    pub accepted: bool,
    pub reason: String,
}

impl ConnectAck {
    pub fn accepted(reason: impl Into<String>) -> Self {
        Self {
            accepted: true,
            reason: reason.into(),
        }
    }

    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }
}

/// Which balance a call operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    #[default]
    Practice,
    Real,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Practice => "PRACTICE",
            AccountType::Real => "REAL",
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, AccountType::Practice)
    }
}

/// Account profile as pushed by the upstream on login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub nick_name: String,
    pub profile_id: String,
    pub demo_balance: f64,
    pub live_balance: f64,
    pub currency: String,
    pub country: String,
}

/// Balance snapshot for one account type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub balance: f64,
    pub account_type: AccountType,
}

/// One tradable instrument, whether it is currently open, and its payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInfo {
    pub name: String,
    pub description: String,
    pub is_open: bool,
    /// Payout percentage for a winning trade, as advertised by the upstream.
    pub payout: f64,
}

/// Direction of a binary-option order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Call,
    Put,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Call => "call",
            OrderDirection::Put => "put",
        }
    }
}

/// Pass-through order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub amount: f64,
    pub asset: String,
    pub direction: OrderDirection,
    /// Option duration in seconds.
    pub duration: i64,
}

/// Upstream acknowledgement of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub asset: String,
    pub amount: f64,
    pub direction: OrderDirection,
    /// Raw upstream payload, passed through untouched.
    pub details: serde_json::Value,
}

/// Capability contract of the upstream broker session.
///
/// Implementations own the network protocol; callers own the lifecycle
/// (connect ordering, reconnects, teardown) via the connection manager.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Establish the session. Returns the upstream's accept/refuse verdict;
    /// transport failures are errors.
    async fn connect(&self) -> GatewayResult<ConnectAck>;

    /// Lightweight liveness probe. Never re-authenticates; implementations
    /// fold probe errors into `false`.
    async fn check_connected(&self) -> bool;

    /// Retrieve candles ending at `end_time` (seconds since epoch). The
    /// result may be empty, never "null".
    async fn get_candles(
        &self,
        asset: &str,
        end_time: i64,
        offset_secs: i64,
        period_secs: i64,
        progressive: bool,
    ) -> GatewayResult<Vec<Candle>>;

    /// Account profile cached from the login handshake.
    async fn profile(&self) -> GatewayResult<Profile>;

    /// Balance of the requested account, switching the active account if the
    /// upstream requires it.
    async fn balance(&self, account: AccountType) -> GatewayResult<Balance>;

    /// All tradable instruments known to the session.
    async fn assets(&self) -> GatewayResult<Vec<AssetInfo>>;

    /// Place a binary-option order and return the upstream receipt.
    async fn place_order(&self, order: &OrderRequest) -> GatewayResult<OrderReceipt>;

    /// Tear down the session. Idempotent.
    async fn close(&self);
}
