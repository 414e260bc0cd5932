//! Core types for the Quotex trading gateway
//!
//! This crate defines the shared data structures used across the gateway,
//! including candles, the session capability contract, and the connection
//! status record.

pub mod candle;
pub mod error;
pub mod session;
pub mod status;

pub use candle::{Candle, CandleKey, FetchWindow};
pub use error::{GatewayError, GatewayResult};
pub use session::{
    AccountType, AssetInfo, Balance, ConnectAck, OrderDirection, OrderReceipt, OrderRequest,
    Profile, SessionApi,
};
pub use status::ConnectionStatus;
