//! Quotex websocket session
//!
//! One authenticated websocket per session handle. `connect` performs the
//! authorization handshake and spawns a single reader task that answers
//! pings, caches the profile and instrument pushes, and routes candle and
//! order replies to the request in flight. The gateway's connection manager
//! owns the lifecycle; this type only speaks the protocol.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use gateway_core::{
    AccountType, AssetInfo, Balance, Candle, ConnectAck, GatewayError, GatewayResult, OrderReceipt,
    OrderRequest, Profile, SessionApi,
};

use crate::codec::{self, Frame};
use crate::config::QuotexConfig;
use crate::expiration::next_expiration_time;

/// Outbound websocket writer handle plus the tasks servicing the socket.
struct Wire {
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// State shared between the session facade and its reader task.
#[derive(Default)]
struct Shared {
    alive: AtomicBool,
    demo: AtomicBool,
    profile: StdMutex<Option<Profile>>,
    assets: StdMutex<Vec<AssetInfo>>,
    auth_slot: StdMutex<Option<oneshot::Sender<ConnectAck>>>,
    candle_slot: StdMutex<Option<oneshot::Sender<Value>>>,
    order_slot: StdMutex<Option<oneshot::Sender<Value>>>,
}

impl Shared {
    fn resolve(slot: &StdMutex<Option<oneshot::Sender<Value>>>, payload: Value) {
        if let Some(tx) = slot.lock().unwrap().take() {
            let _ = tx.send(payload);
        }
    }
}

/// Session client for the upstream broker.
pub struct QuotexSession {
    config: QuotexConfig,
    wire: Mutex<Option<Wire>>,
    shared: Arc<Shared>,
    request_seq: AtomicU64,
}

impl QuotexSession {
    pub fn new(config: QuotexConfig) -> Self {
        let shared = Arc::new(Shared::default());
        shared.demo.store(config.demo, Ordering::SeqCst);
        Self {
            config,
            wire: Mutex::new(None),
            shared,
            request_seq: AtomicU64::new(1),
        }
    }

    fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.config.reply_timeout_secs)
    }

    fn send_frame(&self, outbound: &mpsc::UnboundedSender<Message>, frame: String) -> GatewayResult<()> {
        outbound
            .send(Message::text(frame))
            .map_err(|_| GatewayError::session("websocket writer is gone"))
    }

    /// Queue a frame on the current wire, failing if the session is down.
    async fn send(&self, frame: String) -> GatewayResult<()> {
        let wire = self.wire.lock().await;
        let wire = wire
            .as_ref()
            .ok_or_else(|| GatewayError::session("session is not connected"))?;
        self.send_frame(&wire.outbound, frame)
    }

    fn spawn_reader(
        &self,
        mut stream: impl Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Send
            + Unpin
            + 'static,
        outbound: mpsc::UnboundedSender<Message>,
    ) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                let msg = match item {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("Websocket read error: {}", e);
                        break;
                    }
                };
                match msg {
                    Message::Text(txt) => handle_frame(&shared, &outbound, txt.as_str()),
                    Message::Close(_) => {
                        debug!("Upstream closed the websocket");
                        break;
                    }
                    _ => {}
                }
            }
            shared.alive.store(false, Ordering::SeqCst);
        })
    }
}

/// Dispatch one inbound text frame.
fn handle_frame(shared: &Arc<Shared>, outbound: &mpsc::UnboundedSender<Message>, raw: &str) {
    let frame = match codec::parse_frame(raw) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Ignoring unparseable frame: {}", e);
            return;
        }
    };
    match frame {
        Frame::Ping => {
            let _ = outbound.send(Message::text(codec::encode_pong()));
        }
        Frame::Open(params) => {
            debug!(ping_interval = ?params.get("pingInterval"), "Transport open");
        }
        Frame::Connected => debug!("Namespace connected"),
        Frame::Close | Frame::Disconnected => {
            shared.alive.store(false, Ordering::SeqCst);
        }
        Frame::Pong => {}
        Frame::Event { name, payload } => handle_event(shared, &name, payload),
    }
}

fn handle_event(shared: &Arc<Shared>, name: &str, payload: Option<Value>) {
    match name {
        "s_authorization" => {
            shared.alive.store(true, Ordering::SeqCst);
            if let Some(payload) = payload.as_ref() {
                match ProfilePayload::from_value(payload) {
                    Ok(profile) => {
                        *shared.profile.lock().unwrap() = Some(profile);
                    }
                    Err(e) => warn!("Could not parse profile from authorization ack: {}", e),
                }
            }
            if let Some(tx) = shared.auth_slot.lock().unwrap().take() {
                let _ = tx.send(ConnectAck::accepted("Websocket connected successfully"));
            }
        }
        "authorization/reject" => {
            shared.alive.store(false, Ordering::SeqCst);
            if let Some(tx) = shared.auth_slot.lock().unwrap().take() {
                let _ = tx.send(ConnectAck::refused(
                    "User not authorized: check the session token",
                ));
            }
        }
        "instruments/list" => {
            if let Some(payload) = payload {
                let assets = parse_instruments(&payload);
                debug!(count = assets.len(), "Instrument list updated");
                *shared.assets.lock().unwrap() = assets;
            }
        }
        "candles/loaded" => {
            Shared::resolve(&shared.candle_slot, payload.unwrap_or(Value::Null));
        }
        "orders/opened" => {
            Shared::resolve(&shared.order_slot, payload.unwrap_or(Value::Null));
        }
        "orders/error" => {
            Shared::resolve(
                &shared.order_slot,
                json!({"error": payload.unwrap_or(Value::Null)}),
            );
        }
        other => debug!("Unhandled event: {}", other),
    }
}

#[async_trait]
impl SessionApi for QuotexSession {
    async fn connect(&self) -> GatewayResult<ConnectAck> {
        let mut wire = self.wire.lock().await;

        // Tear down a previous socket before dialing again; `connect` doubles
        // as the single reconnect path.
        if let Some(old) = wire.take() {
            old.reader.abort();
            old.writer.abort();
            self.shared.alive.store(false, Ordering::SeqCst);
        }

        let (ws, _response) = connect_async(self.config.ws_url.as_str())
            .await
            .map_err(|e| GatewayError::session(format!("websocket connect failed: {e}")))?;
        let (mut sink, stream) = ws.split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                if let Err(e) = sink.send(msg).await {
                    warn!("Websocket write error: {}", e);
                    break;
                }
            }
        });

        let (auth_tx, auth_rx) = oneshot::channel();
        *self.shared.auth_slot.lock().unwrap() = Some(auth_tx);

        let reader = self.spawn_reader(stream, outbound.clone());

        let auth = json!({
            "session": self.config.ssid,
            "isDemo": if self.shared.demo.load(Ordering::SeqCst) { 1 } else { 0 },
            "tournamentId": 0,
        });
        self.send_frame(&outbound, codec::encode_event("authorization", &auth))?;

        *wire = Some(Wire {
            outbound,
            reader,
            writer,
        });
        drop(wire);

        match timeout(self.reply_timeout(), auth_rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(GatewayError::session("authorization channel dropped")),
            Err(_) => Ok(ConnectAck::refused("authorization timed out")),
        }
    }

    async fn check_connected(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    async fn get_candles(
        &self,
        asset: &str,
        end_time: i64,
        offset_secs: i64,
        period_secs: i64,
        progressive: bool,
    ) -> GatewayResult<Vec<Candle>> {
        if !self.check_connected().await {
            return Err(GatewayError::session("session is not connected"));
        }

        let (tx, rx) = oneshot::channel();
        *self.shared.candle_slot.lock().unwrap() = Some(tx);

        let request = json!({
            "asset": asset,
            "index": self.request_seq.fetch_add(1, Ordering::SeqCst),
            "time": end_time,
            "offset": offset_secs,
            "period": period_secs,
            "progressive": progressive,
        });
        self.send(codec::encode_event("candles/load", &request)).await?;

        let payload = timeout(self.reply_timeout(), rx)
            .await
            .map_err(|_| GatewayError::session("candle request timed out"))?
            .map_err(|_| GatewayError::session("candle reply channel dropped"))?;

        parse_candles(&payload)
    }

    async fn profile(&self) -> GatewayResult<Profile> {
        self.shared
            .profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GatewayError::session("profile not received yet"))
    }

    async fn balance(&self, account: AccountType) -> GatewayResult<Balance> {
        let want_demo = account.is_demo();
        if self.shared.demo.swap(want_demo, Ordering::SeqCst) != want_demo {
            let change = json!({ "demoMode": want_demo });
            self.send(codec::encode_event("account/change", &change)).await?;
        }

        let profile = self.profile().await?;
        let balance = if want_demo {
            profile.demo_balance
        } else {
            profile.live_balance
        };
        Ok(Balance {
            balance,
            account_type: account,
        })
    }

    async fn assets(&self) -> GatewayResult<Vec<AssetInfo>> {
        Ok(self.shared.assets.lock().unwrap().clone())
    }

    async fn place_order(&self, order: &OrderRequest) -> GatewayResult<OrderReceipt> {
        if !self.check_connected().await {
            return Err(GatewayError::session("session is not connected"));
        }

        let is_demo = self.shared.demo.load(Ordering::SeqCst);
        let request_id = self.request_seq.fetch_add(1, Ordering::SeqCst);

        // OTC instruments take a plain duration; exchange-traded ones take an
        // absolute expiration on a minute boundary.
        let (option_type, time) = if order.asset.contains("_otc") {
            (100, order.duration)
        } else {
            let now = chrono::Utc::now().timestamp();
            (1, next_expiration_time(now, order.duration))
        };

        let (tx, rx) = oneshot::channel();
        *self.shared.order_slot.lock().unwrap() = Some(tx);

        // Follow the instrument's depth and tick feeds before opening, as the
        // upstream expects for order placement.
        self.send(codec::encode_event("depth/follow", &Value::String(order.asset.clone())))
            .await?;
        self.send(codec::encode_bare_event("tick")).await?;

        let payload = json!({
            "asset": order.asset,
            "amount": order.amount,
            "time": time,
            "action": order.direction.as_str(),
            "isDemo": if is_demo { 1 } else { 0 },
            "tournamentId": 0,
            "requestId": request_id,
            "optionType": option_type,
        });
        self.send(codec::encode_event("orders/open", &payload)).await?;

        let reply = timeout(self.reply_timeout(), rx)
            .await
            .map_err(|_| GatewayError::session("order reply timed out"))?
            .map_err(|_| GatewayError::session("order reply channel dropped"))?;

        if let Some(err) = reply.get("error") {
            return Err(GatewayError::rejected(err.to_string()));
        }

        let order_id = reply
            .get("id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| request_id.to_string());

        Ok(OrderReceipt {
            order_id,
            asset: order.asset.clone(),
            amount: order.amount,
            direction: order.direction,
            details: reply,
        })
    }

    async fn close(&self) {
        let mut wire = self.wire.lock().await;
        if let Some(wire) = wire.take() {
            let _ = wire.outbound.send(Message::Close(None));
            wire.reader.abort();
            wire.writer.abort();
        }
        self.shared.alive.store(false, Ordering::SeqCst);
    }
}

/// Profile fields pushed inside the authorization ack.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePayload {
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    id: Value,
    #[serde(default)]
    demo_balance: f64,
    #[serde(default)]
    live_balance: f64,
    #[serde(default)]
    currency_code: String,
    #[serde(default)]
    country_name: String,
}

impl ProfilePayload {
    fn from_value(value: &Value) -> GatewayResult<Profile> {
        let payload: ProfilePayload = serde_json::from_value(value.clone())
            .map_err(|e| GatewayError::parse(format!("bad profile payload: {e}")))?;
        Ok(Profile {
            nick_name: payload.nickname,
            profile_id: match payload.id {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            },
            demo_balance: payload.demo_balance,
            live_balance: payload.live_balance,
            currency: payload.currency_code,
            country: payload.country_name,
        })
    }
}

/// Candle fields as the upstream sends them; `time` and `volume` arrive as
/// floats.
#[derive(Debug, Deserialize)]
struct RawCandle {
    time: f64,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    #[serde(default)]
    volume: f64,
}

impl From<RawCandle> for Candle {
    fn from(raw: RawCandle) -> Self {
        Candle {
            time: raw.time as i64,
            open: raw.open,
            close: raw.close,
            high: raw.high,
            low: raw.low,
            volume: raw.volume as i64,
        }
    }
}

/// The candle reply is either a bare array or wrapped in `{"candles": [...]}`.
/// A missing list means "no data", never an error.
fn parse_candles(payload: &Value) -> GatewayResult<Vec<Candle>> {
    let list = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("candles") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };

    list.iter()
        .map(|item| {
            serde_json::from_value::<RawCandle>(item.clone())
                .map(Candle::from)
                .map_err(|e| GatewayError::parse(format!("bad candle payload: {e}")))
        })
        .collect()
}

/// Instrument entries arrive either as objects or as positional arrays
/// (`[id, symbol, description, ...]` with the open flag near the tail).
fn parse_instruments(payload: &Value) -> Vec<AssetInfo> {
    let Some(items) = payload.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(AssetInfo {
                name: map.get("symbol")?.as_str()?.to_string(),
                description: map
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                is_open: map.get("open").and_then(Value::as_bool).unwrap_or(false),
                payout: map.get("payment").and_then(Value::as_f64).unwrap_or(0.0),
            }),
            Value::Array(fields) => Some(AssetInfo {
                name: fields.get(1)?.as_str()?.to_string(),
                description: fields
                    .get(2)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                is_open: fields
                    .iter()
                    .rev()
                    .find_map(Value::as_bool)
                    .unwrap_or(false),
                // The payout percent sits after the id/symbol/name/type/
                // precision columns in the positional layout.
                payout: fields.get(5).and_then(Value::as_f64).unwrap_or(0.0),
            }),
            _ => None,
        })
        .collect()
}
