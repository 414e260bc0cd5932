//! Connection lifecycle manager
//!
//! Owns the single upstream session handle for the process and the shared
//! [`ConnectionStatus`] record. Every connect or reconnect attempt runs
//! under one `tokio::sync::Mutex`, so concurrent callers coalesce into one
//! physical attempt and observe its outcome; the keep-alive loop mutates the
//! status through the same lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use gateway_core::{ConnectionStatus, GatewayError, GatewayResult, SessionApi};

/// Builds the session handle on first use. Called at most once per process.
pub type SessionFactory<S> = Box<dyn Fn() -> Arc<S> + Send + Sync>;

struct ConnState<S: ?Sized> {
    session: Option<Arc<S>>,
    status: ConnectionStatus,
}

/// Serializes session construction, connects, reconnects, and status
/// mutation behind one lock.
///
/// The session handle is created lazily on the first
/// [`ensure_connected`](ConnectionManager::ensure_connected) call and closed
/// exactly once by [`shutdown`](ConnectionManager::shutdown). Callers hold
/// the manager through `Arc` and never touch the session without going
/// through it first.
pub struct ConnectionManager<S: SessionApi + ?Sized> {
    state: Mutex<ConnState<S>>,
    factory: SessionFactory<S>,
}

impl<S: SessionApi + ?Sized> ConnectionManager<S> {
    pub fn new(factory: SessionFactory<S>) -> Self {
        Self {
            state: Mutex::new(ConnState {
                session: None,
                status: ConnectionStatus::default(),
            }),
            factory,
        }
    }

    /// Ensure the session exists and is live, connecting or reconnecting as
    /// needed, and return the handle for follow-up calls.
    ///
    /// The whole body runs under the connection lock: concurrent callers
    /// queue up and see the first caller's completed outcome before acting.
    /// Dropping the returned future while waiting on the lock releases
    /// nothing it had not already released, so a caller-side timeout never
    /// leaves the lock held.
    ///
    /// When the session is already connected and the liveness probe passes
    /// this has no side effect beyond the probe itself.
    pub async fn ensure_connected(&self) -> GatewayResult<Arc<S>> {
        let mut state = self.state.lock().await;

        let session = match &state.session {
            Some(session) => Arc::clone(session),
            None => {
                info!("Initializing upstream session client");
                let session = (self.factory)();
                state.session = Some(Arc::clone(&session));
                session
            }
        };

        if !state.status.connected {
            info!("Attempting to connect to upstream");
            match session.connect().await {
                Ok(ack) if ack.accepted => {
                    state.status.mark_connected();
                    info!("Connected successfully: {}", ack.reason);
                }
                Ok(ack) => {
                    state.status.mark_disconnected(Some(ack.reason.clone()));
                    error!("Connection refused: {}", ack.reason);
                    return Err(GatewayError::Connection(ack.reason));
                }
                Err(e) => {
                    let reason = e.to_string();
                    state.status.mark_disconnected(Some(reason.clone()));
                    error!("Connection error: {}", reason);
                    return Err(GatewayError::Connection(reason));
                }
            }
        }

        // Probe liveness even right after a fresh connect; a session that
        // died between handshake and first use gets its one reconnect here.
        if !session.check_connected().await {
            state.status.mark_disconnected(None);
            warn!("Session lost, attempting to reconnect");
            match session.connect().await {
                Ok(ack) if ack.accepted => {
                    state.status.mark_connected();
                    info!("Reconnected successfully");
                }
                Ok(ack) => {
                    state.status.mark_disconnected(Some(ack.reason.clone()));
                    error!("Reconnection refused: {}", ack.reason);
                    return Err(GatewayError::Reconnection(ack.reason));
                }
                Err(e) => {
                    let reason = e.to_string();
                    state.status.mark_disconnected(Some(reason.clone()));
                    error!("Reconnection error: {}", reason);
                    return Err(GatewayError::Reconnection(reason));
                }
            }
        }

        Ok(session)
    }

    /// Snapshot of the shared status record.
    pub async fn status(&self) -> ConnectionStatus {
        self.state.lock().await.status.clone()
    }

    /// One keep-alive tick: probe the session if we believe it is connected
    /// and downgrade the status when the probe fails.
    ///
    /// Deliberately does not reconnect; that is reserved for the next
    /// caller-driven [`ensure_connected`](ConnectionManager::ensure_connected).
    /// Runs under the same lock as every other status mutation.
    pub async fn keepalive_probe(&self) {
        let mut state = self.state.lock().await;
        if !state.status.connected {
            return;
        }
        let Some(session) = state.session.as_ref().map(Arc::clone) else {
            return;
        };
        if session.check_connected().await {
            debug!("Connection is alive");
        } else {
            warn!("Connection check failed, will reconnect on next request");
            state.status.mark_disconnected(None);
        }
    }

    /// Close the session exactly once at process shutdown.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            session.close().await;
            state.status.mark_disconnected(None);
            info!("Upstream session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSession;
    use gateway_core::ConnectAck;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn manager_for(mock: Arc<MockSession>) -> Arc<ConnectionManager<MockSession>> {
        Arc::new(ConnectionManager::new(Box::new(move || Arc::clone(&mock))))
    }

    #[tokio::test]
    async fn test_factory_called_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let built_in_factory = Arc::clone(&built);
        let manager: ConnectionManager<MockSession> = ConnectionManager::new(Box::new(move || {
            built_in_factory.fetch_add(1, Ordering::SeqCst);
            Arc::new(MockSession::new())
        }));

        manager.ensure_connected().await.unwrap();
        manager.ensure_connected().await.unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_coalesce_into_one_connect() {
        let mock = Arc::new(MockSession::new());
        mock.set_connect_delay(Duration::from_millis(20));
        let manager = manager_for(Arc::clone(&mock));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(
                async move { manager.ensure_connected().await },
            ));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(mock.connect_calls.load(Ordering::SeqCst), 1);
        let status = manager.status().await;
        assert!(status.connected);
        assert!(status.last_connected_at.is_some());
    }

    #[tokio::test]
    async fn test_refused_connect_surfaces_connection_error() {
        let mock = Arc::new(MockSession::new());
        mock.push_connect(Ok(ConnectAck::refused("User not Authorized")));
        let manager = manager_for(Arc::clone(&mock));

        let err = manager.ensure_connected().await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection(_)));

        let status = manager.status().await;
        assert!(!status.connected);
        assert_eq!(status.last_error.as_deref(), Some("User not Authorized"));
    }

    #[tokio::test]
    async fn test_liveness_failure_triggers_single_reconnect() {
        let mock = Arc::new(MockSession::new());
        let manager = manager_for(Arc::clone(&mock));

        manager.ensure_connected().await.unwrap();
        assert_eq!(mock.connect_calls.load(Ordering::SeqCst), 1);

        // Next probe reports the session dead; the reconnect succeeds.
        mock.push_check(false);
        manager.ensure_connected().await.unwrap();

        assert_eq!(mock.connect_calls.load(Ordering::SeqCst), 2);
        assert!(manager.status().await.connected);
    }

    #[tokio::test]
    async fn test_failed_reconnect_surfaces_reconnection_error() {
        let mock = Arc::new(MockSession::new());
        let manager = manager_for(Arc::clone(&mock));

        manager.ensure_connected().await.unwrap();

        mock.push_check(false);
        mock.push_connect(Ok(ConnectAck::refused("Handshake timeout")));
        let err = manager.ensure_connected().await.unwrap_err();

        assert!(matches!(err, GatewayError::Reconnection(_)));
        let status = manager.status().await;
        assert!(!status.connected);
        assert_eq!(status.last_error.as_deref(), Some("Handshake timeout"));
    }

    #[tokio::test]
    async fn test_connected_and_live_is_idempotent() {
        let mock = Arc::new(MockSession::new());
        let manager = manager_for(Arc::clone(&mock));

        manager.ensure_connected().await.unwrap();
        let before = manager.status().await.last_connected_at;

        manager.ensure_connected().await.unwrap();
        assert_eq!(mock.connect_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.status().await.last_connected_at, before);
    }

    #[tokio::test]
    async fn test_shutdown_closes_session_once() {
        let mock = Arc::new(MockSession::new());
        let manager = manager_for(Arc::clone(&mock));

        manager.ensure_connected().await.unwrap();
        manager.shutdown().await;
        manager.shutdown().await;

        assert_eq!(mock.close_calls.load(Ordering::SeqCst), 1);
        assert!(!manager.status().await.connected);
    }
}
