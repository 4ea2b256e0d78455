//! Typed request and response payloads for every command method.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::method::Method;
use crate::model::{Client, Group, Server, Volume};

/// A request payload bound to the command method that carries it.
pub trait Command: Serialize {
    const METHOD: Method;
    type Response: DeserializeOwned;
}

macro_rules! command {
    ($request:ty => $response:ty, $method:expr) => {
        impl Command for $request {
            const METHOD: Method = $method;
            type Response = $response;
        }
    };
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientGetStatusRequest {
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientGetStatusResponse {
    pub client: Client,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSetVolumeRequest {
    pub id: String,
    pub volume: Volume,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSetVolumeResponse {
    pub volume: Volume,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSetLatencyRequest {
    pub id: String,
    pub latency: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSetLatencyResponse {
    pub latency: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSetNameRequest {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSetNameResponse {
    pub name: String,
}

command!(ClientGetStatusRequest => ClientGetStatusResponse, Method::ClientGetStatus);
command!(ClientSetVolumeRequest => ClientSetVolumeResponse, Method::ClientSetVolume);
command!(ClientSetLatencyRequest => ClientSetLatencyResponse, Method::ClientSetLatency);
command!(ClientSetNameRequest => ClientSetNameResponse, Method::ClientSetName);

// =============================================================================
// GROUP
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupGetStatusRequest {
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupGetStatusResponse {
    pub group: Group,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSetMuteRequest {
    pub id: String,
    pub muted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSetMuteResponse {
    pub muted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSetStreamRequest {
    pub id: String,
    pub stream_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSetStreamResponse {
    pub stream_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSetClientsRequest {
    pub id: String,
    pub clients: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSetClientsResponse {
    pub clients: Vec<Client>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSetNameRequest {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSetNameResponse {
    pub name: String,
}

command!(GroupGetStatusRequest => GroupGetStatusResponse, Method::GroupGetStatus);
command!(GroupSetMuteRequest => GroupSetMuteResponse, Method::GroupSetMute);
command!(GroupSetStreamRequest => GroupSetStreamResponse, Method::GroupSetStream);
command!(GroupSetClientsRequest => GroupSetClientsResponse, Method::GroupSetClients);
command!(GroupSetNameRequest => GroupSetNameResponse, Method::GroupSetName);

// =============================================================================
// SERVER
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerGetRpcVersionRequest {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerGetRpcVersionResponse {
    pub major: i64,
    pub minor: i64,
    pub patch: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerGetStatusRequest {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerGetStatusResponse {
    pub server: Server,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerDeleteClientRequest {
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerDeleteClientResponse {
    pub server: Server,
}

command!(ServerGetRpcVersionRequest => ServerGetRpcVersionResponse, Method::ServerGetRpcVersion);
command!(ServerGetStatusRequest => ServerGetStatusResponse, Method::ServerGetStatus);
command!(ServerDeleteClientRequest => ServerDeleteClientResponse, Method::ServerDeleteClient);

// =============================================================================
// STREAM
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamAddStreamRequest {
    #[serde(rename = "streamUri")]
    pub stream_uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamAddStreamResponse {
    pub stream_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamRemoveStreamRequest {
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamRemoveStreamResponse {
    pub stream_id: String,
}

/// Playback control on a stream, e.g. `{"command": "play", "params": {}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamControlRequest {
    pub command: String,
    pub params: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSetPropertyRequest {
    pub id: String,
    pub property: Value,
    pub value: Value,
}

command!(StreamAddStreamRequest => StreamAddStreamResponse, Method::StreamAddStream);
command!(StreamRemoveStreamRequest => StreamRemoveStreamResponse, Method::StreamRemoveStream);
// Both answer with a bare string (typically "ok").
command!(StreamControlRequest => String, Method::StreamControl);
command!(StreamSetPropertyRequest => String, Method::StreamSetProperty);

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
