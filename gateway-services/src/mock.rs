//! Scriptable session mock shared by the service tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use gateway_core::{
    AccountType, AssetInfo, Balance, Candle, ConnectAck, GatewayError, GatewayResult,
    OrderReceipt, OrderRequest, Profile, SessionApi,
};

/// A `SessionApi` double driven by per-method scripts.
///
/// Each script is a queue of prepared outcomes; when a queue runs dry the
/// mock falls back to a benign default (accepted connect, live probe, empty
/// candle batch). Call counts and the arguments of every candle retrieval
/// are recorded for assertions.
#[derive(Debug, Default)]
pub struct MockSession {
    pub connect_calls: AtomicUsize,
    pub check_calls: AtomicUsize,
    pub candle_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
    connect_script: StdMutex<VecDeque<GatewayResult<ConnectAck>>>,
    check_script: StdMutex<VecDeque<bool>>,
    candle_script: StdMutex<VecDeque<GatewayResult<Vec<Candle>>>>,
    /// `(end_time, offset_secs, period_secs)` of every `get_candles` call.
    pub recorded_calls: StdMutex<Vec<(i64, i64, i64)>>,
    /// Artificial latency inside `connect`, to widen race windows in
    /// coalescing tests.
    pub connect_delay: StdMutex<Duration>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_connect(&self, outcome: GatewayResult<ConnectAck>) {
        self.connect_script.lock().unwrap().push_back(outcome);
    }

    pub fn push_check(&self, alive: bool) {
        self.check_script.lock().unwrap().push_back(alive);
    }

    pub fn push_candles(&self, outcome: GatewayResult<Vec<Candle>>) {
        self.candle_script.lock().unwrap().push_back(outcome);
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl SessionApi for MockSession {
    async fn connect(&self) -> GatewayResult<ConnectAck> {
        let delay = *self.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ConnectAck::accepted("Websocket connected successfully!!!")))
    }

    async fn check_connected(&self) -> bool {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.check_script.lock().unwrap().pop_front().unwrap_or(true)
    }

    async fn get_candles(
        &self,
        _asset: &str,
        end_time: i64,
        offset_secs: i64,
        period_secs: i64,
        _progressive: bool,
    ) -> GatewayResult<Vec<Candle>> {
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        self.recorded_calls
            .lock()
            .unwrap()
            .push((end_time, offset_secs, period_secs));
        self.candle_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn profile(&self) -> GatewayResult<Profile> {
        Ok(Profile::default())
    }

    async fn balance(&self, account: AccountType) -> GatewayResult<Balance> {
        Ok(Balance {
            balance: 0.0,
            account_type: account,
        })
    }

    async fn assets(&self) -> GatewayResult<Vec<AssetInfo>> {
        Ok(Vec::new())
    }

    async fn place_order(&self, _order: &OrderRequest) -> GatewayResult<OrderReceipt> {
        Err(GatewayError::rejected("mock session does not trade"))
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}
