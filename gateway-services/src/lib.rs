//! Connection lifecycle and candle assembly services
//!
//! Three pieces make up the stateful heart of the gateway:
//!
//! - [`ConnectionManager`] owns the one session handle per process and
//!   serializes every connect/reconnect attempt behind a single lock.
//! - [`KeepAlive`] is the background probe that downgrades the shared status
//!   when the session goes quiet, leaving reconnection to the next caller.
//! - [`ProgressiveFetcher`] assembles a multi-day candle window out of
//!   many rate-limited retrieval calls, deduplicating the result.

pub mod connection;
pub mod keepalive;
pub mod progressive;

pub use connection::{ConnectionManager, SessionFactory};
pub use keepalive::KeepAlive;
pub use progressive::{FetcherConfig, ProgressiveFetcher};

#[cfg(test)]
pub(crate) mod mock;
