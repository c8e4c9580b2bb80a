//! JSON frame codec.
//!
//! A frame is one WebSocket text message: `{"event": "<wire-name>", "data":
//! <payload>}`.  Client and endpoint share these helpers so both sides agree
//! on the encoding.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tablepulse_types::{Command, PulseError, ServerEvent};

/// Decode an inbound frame pushed by the endpoint.
pub fn decode_server_event(text: &str) -> Result<ServerEvent, PulseError> {
    decode(text)
}

/// Decode a command frame sent by a client.
pub fn decode_command(text: &str) -> Result<Command, PulseError> {
    decode(text)
}

pub fn encode_server_event(event: &ServerEvent) -> Result<String, PulseError> {
    encode(event)
}

pub fn encode_command(command: &Command) -> Result<String, PulseError> {
    encode(command)
}

fn encode<T: Serialize>(value: &T) -> Result<String, PulseError> {
    serde_json::to_string(value).map_err(|e| PulseError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, PulseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| PulseError::Serialization(e.to_string()))?;

    let name = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or_else(|| PulseError::Protocol("frame has no event name".to_string()))?
        .to_string();

    serde_json::from_value(value).map_err(|e| {
        let detail = e.to_string();
        if detail.contains("unknown variant") {
            PulseError::Protocol(format!("unknown event '{name}'"))
        } else {
            PulseError::Serialization(format!("malformed '{name}' payload: {detail}"))
        }
    })
}
