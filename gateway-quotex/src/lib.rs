//! Quotex broker session client
//!
//! Implements the gateway's [`SessionApi`](gateway_core::SessionApi)
//! capability over the broker's socket.io-style websocket protocol, plus a
//! deterministic sample session for deployments without upstream
//! credentials.

pub mod client;
pub mod codec;
pub mod config;
pub mod expiration;
pub mod sample;

pub use client::QuotexSession;
pub use config::QuotexConfig;
pub use sample::SampleSession;
