//! Background keep-alive loop
//!
//! Probes the session on a fixed period and downgrades the shared status
//! when the probe fails. Never reconnects on its own and never dies on a
//! probe error; it only stops when the shutdown token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connection::ConnectionManager;
use gateway_core::SessionApi;

/// Default probe period.
pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(30);

/// Periodic liveness prober for the shared session.
pub struct KeepAlive<S: SessionApi + ?Sized> {
    manager: Arc<ConnectionManager<S>>,
    period: Duration,
}

impl<S: SessionApi + ?Sized> KeepAlive<S> {
    pub fn new(manager: Arc<ConnectionManager<S>>) -> Self {
        Self {
            manager,
            period: KEEPALIVE_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Each tick goes through [`ConnectionManager::keepalive_probe`], which
    /// takes the same connection lock as caller-driven connects; a probe
    /// that observes a dead session only flags the status and leaves
    /// reconnection to the next request. The cancellation check sits at the
    /// wait boundary, so shutdown never interrupts a probe mid-mutation.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(period_secs = self.period.as_secs(), "Starting keep-alive loop");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of `interval` completes immediately; consume it so
        // the first probe happens one full period after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Keep-alive loop stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.manager.keepalive_probe().await;
                }
            }
        }
    }
}
