//! Shared connection status record

use chrono::{DateTime, Utc};
use std::time::Instant;

/// Status of the upstream session, as last observed.
///
/// There is a single instance per process, owned by the connection manager
/// and mutated only while its connection lock is held. The keep-alive loop
/// goes through the same lock, so there is exactly one writer section at any
/// time.
///
/// Invariant: `connected == true` implies `last_connected_at.is_some()`.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub last_error: Option<String>,
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Monotonic counterpart of `last_connected_at`, for uptime reporting.
    pub last_connected_instant: Option<Instant>,
}

impl ConnectionStatus {
    /// Record a successful connect (or reconnect).
    pub fn mark_connected(&mut self) {
        self.connected = true;
        self.last_connected_at = Some(Utc::now());
        self.last_connected_instant = Some(Instant::now());
        self.last_error = None;
    }

    /// Record a failed connect attempt or lost session.
    pub fn mark_disconnected(&mut self, error: Option<String>) {
        self.connected = false;
        if let Some(reason) = error {
            self.last_error = Some(reason);
        }
    }

    /// Seconds since the session was last established, if it ever was.
    pub fn uptime_secs(&self) -> Option<f64> {
        self.last_connected_instant
            .map(|t| t.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_implies_timestamp() {
        let mut status = ConnectionStatus::default();
        assert!(status.last_connected_at.is_none());

        status.mark_connected();
        assert!(status.connected);
        assert!(status.last_connected_at.is_some());
        assert!(status.last_error.is_none());
        assert!(status.uptime_secs().is_some());
    }

    #[test]
    fn test_disconnect_keeps_last_connected() {
        let mut status = ConnectionStatus::default();
        status.mark_connected();
        status.mark_disconnected(Some("socket closed".to_string()));

        assert!(!status.connected);
        assert_eq!(status.last_error.as_deref(), Some("socket closed"));
        // The timestamp records the last successful connect, not the drop.
        assert!(status.last_connected_at.is_some());
    }

    #[test]
    fn test_disconnect_without_reason_preserves_error() {
        let mut status = ConnectionStatus::default();
        status.mark_disconnected(Some("refused".to_string()));
        status.mark_disconnected(None);
        assert_eq!(status.last_error.as_deref(), Some("refused"));
    }
}
