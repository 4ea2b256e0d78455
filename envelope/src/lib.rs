//! Shared envelope model and JSON codec for the Snapcast control protocol.
//!
//! This crate owns the wire representation used by both the command channel
//! (one HTTP exchange per request) and the notification stream (one text
//! frame per pushed event). `params`/`result` payloads stay
//! flexible (`serde_json::Value`) so routing can happen on the method name
//! before any concrete payload type is chosen.

pub mod command;
pub mod method;
pub mod model;
pub mod notification;

use std::time::SystemTime;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use command::Command;
pub use method::{Method, NotificationMethod};
pub use notification::Notification;

/// Protocol version stamped on every outbound envelope.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Error returned by the codec functions in this crate.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An envelope or payload could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
    /// The raw bytes are not a JSON envelope.
    #[error("failed to decode envelope: {0}")]
    Decode(#[source] serde_json::Error),
    /// An opaque payload does not match the requested concrete type.
    #[error("failed to decode payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Structured failure carried by a response envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rpc error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// A single JSON-RPC message, in either direction, on either transport.
///
/// Commands carry `id`, `method` and `params`. Responses carry `id` and
/// `result` or `error`. Pushed notifications carry `method` and `params`
/// but never `id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    /// Local receipt time. Set by [`decode_envelope`], never transmitted.
    #[serde(skip)]
    pub received_at: Option<SystemTime>,
}

impl Envelope {
    /// Build an outbound command envelope.
    #[must_use]
    pub fn request(id: u64, method: Method, params: Value) -> Self {
        Self {
            id: Some(id),
            jsonrpc: PROTOCOL_VERSION.to_owned(),
            method: Some(method.as_str().to_owned()),
            params: Some(params),
            ..Self::default()
        }
    }

    /// Build a pushed notification envelope, as the server emits them.
    #[must_use]
    pub fn notification(method: NotificationMethod, params: Value) -> Self {
        Self {
            jsonrpc: PROTOCOL_VERSION.to_owned(),
            method: Some(method.as_str().to_owned()),
            params: Some(params),
            ..Self::default()
        }
    }

    /// True when the frame carries both a method and params. This is the only
    /// test applied to decide whether a stream frame is routed at all.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.params.is_some()
    }

    /// True when the frame has no method, i.e. it answers a command.
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.method.is_none()
    }

    /// Re-marshal `result` into a concrete response type.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Payload`] when the result does not match `T`.
    pub fn parse_result<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        parse_value(self.result.clone().unwrap_or(Value::Null))
    }

    /// Re-marshal `params` into a concrete payload type.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Payload`] when the params do not match `T`.
    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        parse_value(self.params.clone().unwrap_or(Value::Null))
    }
}

/// Encode an envelope into JSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(envelope).map_err(CodecError::Encode)
}

/// Decode JSON bytes into an envelope and stamp its receipt time.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for bytes that are not a JSON object of
/// the envelope shape.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let mut envelope: Envelope = serde_json::from_slice(bytes).map_err(CodecError::Decode)?;
    envelope.received_at = Some(SystemTime::now());
    Ok(envelope)
}

/// Convert an opaque JSON payload into a concrete type.
///
/// # Errors
///
/// Returns [`CodecError::Payload`] when `value` does not match `T`.
pub fn parse_value<T: DeserializeOwned>(value: Value) -> Result<T, CodecError> {
    serde_json::from_value(value).map_err(CodecError::Payload)
}

/// Convert a concrete payload into an opaque JSON value.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if `payload` cannot be represented as JSON.
pub fn to_value<T: Serialize + ?Sized>(payload: &T) -> Result<Value, CodecError> {
    serde_json::to_value(payload).map_err(CodecError::Encode)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
