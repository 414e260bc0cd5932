//! Engine.io / socket.io text frame codec
//!
//! The upstream speaks engine.io v3 over a single websocket: every text
//! frame starts with a packet-type digit (`0` open, `1` close, `2` ping,
//! `3` pong, `4` message), and message frames carry a socket.io sub-type
//! (`0` namespace connect, `1` disconnect, `2` event). Events are JSON
//! arrays of `[name, payload?]`.

use gateway_core::{GatewayError, GatewayResult};
use serde_json::Value;

/// One decoded engine.io frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `0{...}`: transport open, carries session parameters.
    Open(Value),
    /// `1`: transport close.
    Close,
    /// `2`: server ping; must be answered with a pong.
    Ping,
    /// `3`: pong.
    Pong,
    /// `40`: namespace connected.
    Connected,
    /// `41`: namespace disconnected.
    Disconnected,
    /// `42[...]`: named event with optional payload.
    Event { name: String, payload: Option<Value> },
}

/// Encode an event frame with a JSON payload.
pub fn encode_event(name: &str, payload: &Value) -> String {
    format!("42[{},{}]", Value::String(name.to_string()), payload)
}

/// Encode an event frame with no payload.
pub fn encode_bare_event(name: &str) -> String {
    format!("42[{}]", Value::String(name.to_string()))
}

/// Pong reply to a server ping.
pub fn encode_pong() -> String {
    "3".to_string()
}

/// Decode one text frame.
pub fn parse_frame(raw: &str) -> GatewayResult<Frame> {
    let mut chars = raw.chars();
    match chars.next() {
        Some('0') => {
            let body: Value = serde_json::from_str(chars.as_str())
                .map_err(|e| GatewayError::parse(format!("bad open frame: {e}")))?;
            Ok(Frame::Open(body))
        }
        Some('1') => Ok(Frame::Close),
        Some('2') => Ok(Frame::Ping),
        Some('3') => Ok(Frame::Pong),
        Some('4') => parse_message(chars.as_str()),
        _ => Err(GatewayError::parse(format!("unknown frame: {raw:.16}"))),
    }
}

fn parse_message(rest: &str) -> GatewayResult<Frame> {
    let mut chars = rest.chars();
    match chars.next() {
        Some('0') => Ok(Frame::Connected),
        Some('1') => Ok(Frame::Disconnected),
        Some('2') => {
            let body: Value = serde_json::from_str(chars.as_str())
                .map_err(|e| GatewayError::parse(format!("bad event frame: {e}")))?;
            let items = body
                .as_array()
                .ok_or_else(|| GatewayError::parse("event frame is not an array"))?;
            let name = items
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| GatewayError::parse("event frame has no name"))?
                .to_string();
            Ok(Frame::Event {
                name,
                payload: items.get(1).cloned(),
            })
        }
        _ => Err(GatewayError::parse(format!("unknown message frame: 4{rest:.16}"))),
    }
}
