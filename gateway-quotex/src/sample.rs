//! Sample-data session
//!
//! Stands in for the real broker in reduced deployments where no session
//! token is available: connects instantly, never drops, and serves a
//! random-walk candle series instead of upstream history. Order placement is
//! refused so the sample mode can never trade.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rand::Rng;

use gateway_core::{
    AccountType, AssetInfo, Balance, Candle, ConnectAck, GatewayError, GatewayResult, OrderReceipt,
    OrderRequest, Profile, SessionApi,
};

/// Opening price of the random walk.
const BASE_PRICE: f64 = 1.0850;

/// Cap on candles returned per retrieval call.
const MAX_CANDLES_PER_CALL: usize = 100;

/// Deterministic-shape (random-valued) stand-in session.
#[derive(Default)]
pub struct SampleSession {
    connected: AtomicBool,
}

impl SampleSession {
    pub fn new() -> Self {
        Self::default()
    }
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}

#[async_trait]
impl SessionApi for SampleSession {
    async fn connect(&self) -> GatewayResult<ConnectAck> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(ConnectAck::accepted("Sample session ready"))
    }

    async fn check_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get_candles(
        &self,
        _asset: &str,
        end_time: i64,
        offset_secs: i64,
        period_secs: i64,
        _progressive: bool,
    ) -> GatewayResult<Vec<Candle>> {
        if !self.check_connected().await {
            return Err(GatewayError::session("session is not connected"));
        }
        if period_secs <= 0 {
            return Err(GatewayError::session("period must be positive"));
        }

        let requested = (offset_secs / period_secs).max(0) as usize;
        let count = requested.min(MAX_CANDLES_PER_CALL);
        let aligned_end = end_time - end_time % period_secs;

        let mut rng = rand::rng();
        let mut base_price = BASE_PRICE;
        let mut candles = Vec::with_capacity(count);

        for i in 0..count {
            let open = base_price + rng.random_range(-0.0005..0.0005);
            let close = open + rng.random_range(-0.0003..0.0003);
            let high = open.max(close) + rng.random_range(0.0..0.0002);
            let low = open.min(close) - rng.random_range(0.0..0.0002);

            candles.push(Candle {
                time: aligned_end - (i as i64) * period_secs,
                open: round5(open),
                close: round5(close),
                high: round5(high),
                low: round5(low),
                volume: rng.random_range(100..=1000),
            });

            base_price = close;
        }

        Ok(candles)
    }

    async fn profile(&self) -> GatewayResult<Profile> {
        Ok(Profile {
            nick_name: "sample".to_string(),
            profile_id: "sample-0".to_string(),
            demo_balance: 10_000.0,
            live_balance: 0.0,
            currency: "USD".to_string(),
            country: "N/A".to_string(),
        })
    }

    async fn balance(&self, account: AccountType) -> GatewayResult<Balance> {
        let balance = match account {
            AccountType::Practice => 10_000.0,
            AccountType::Real => 0.0,
        };
        Ok(Balance {
            balance,
            account_type: account,
        })
    }

    async fn assets(&self) -> GatewayResult<Vec<AssetInfo>> {
        Ok(vec![
            AssetInfo {
                name: "EURUSD_otc".to_string(),
                description: "EUR/USD (OTC)".to_string(),
                is_open: true,
                payout: 85.0,
            },
            AssetInfo {
                name: "GBPUSD_otc".to_string(),
                description: "GBP/USD (OTC)".to_string(),
                is_open: true,
                payout: 80.0,
            },
            AssetInfo {
                name: "AUDCAD".to_string(),
                description: "AUD/CAD".to_string(),
                is_open: false,
                payout: 0.0,
            },
        ])
    }

    async fn place_order(&self, _order: &OrderRequest) -> GatewayResult<OrderReceipt> {
        Err(GatewayError::rejected(
            "sample mode does not execute trades",
        ))
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_lifecycle() {
        let session = SampleSession::new();
        assert!(!session.check_connected().await);

        let ack = session.connect().await.unwrap();
        assert!(ack.accepted);
        assert!(session.check_connected().await);

        session.close().await;
        session.close().await;
        assert!(!session.check_connected().await);
    }

    #[tokio::test]
    async fn test_candles_are_well_formed() {
        let session = SampleSession::new();
        session.connect().await.unwrap();

        let candles = session
            .get_candles("EURUSD_otc", 1_700_003_605, 3600, 60, true)
            .await
            .unwrap();

        assert_eq!(candles.len(), 60);
        for candle in &candles {
            assert!(candle.high >= candle.open.max(candle.close));
            assert!(candle.low <= candle.open.min(candle.close));
            assert!((100..=1000).contains(&candle.volume));
            assert_eq!(candle.time % 60, 0);
        }
        // Newest first, one period apart.
        for pair in candles.windows(2) {
            assert_eq!(pair[0].time - pair[1].time, 60);
        }
    }

    #[tokio::test]
    async fn test_candle_count_is_capped() {
        let session = SampleSession::new();
        session.connect().await.unwrap();

        let candles = session
            .get_candles("EURUSD_otc", 1_700_000_000, 86_400, 60, true)
            .await
            .unwrap();
        assert_eq!(candles.len(), 100);
    }

    #[tokio::test]
    async fn test_disconnected_session_refuses_calls() {
        let session = SampleSession::new();
        let err = session
            .get_candles("EURUSD_otc", 0, 3600, 60, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Session(_)));
    }

    #[tokio::test]
    async fn test_orders_are_refused() {
        let session = SampleSession::new();
        session.connect().await.unwrap();
        let order = OrderRequest {
            amount: 10.0,
            asset: "EURUSD_otc".to_string(),
            direction: gateway_core::OrderDirection::Call,
            duration: 60,
        };
        assert!(matches!(
            session.place_order(&order).await.unwrap_err(),
            GatewayError::Rejected(_)
        ));
    }
}
