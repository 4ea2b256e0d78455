//! Domain entities as the server reports them.
//!
//! Field names match the wire exactly. Every struct tolerates missing fields
//! so that older or newer servers still decode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Playback state of a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Idle,
    Playing,
    /// Any status this client does not model (e.g. `"disabled"`).
    #[serde(other)]
    Unknown,
}

impl StreamStatus {
    #[must_use]
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub muted: bool,
    pub percent: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamUri {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub fragment: String,
    pub raw: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    pub id: String,
    pub status: StreamStatus,
    pub uri: StreamUri,
}

/// Machine a client or the server runs on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Host {
    pub name: String,
    pub os: String,
    pub arch: String,
    pub ip: String,
    pub mac: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub instance: i64,
    pub latency: i64,
    pub name: String,
    pub volume: Volume,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastSeen {
    pub sec: i64,
    pub usec: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapclient {
    pub name: String,
    pub version: String,
    pub protocol_version: i64,
}

/// A playback endpoint known to the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub connected: bool,
    pub config: ClientConfig,
    pub host: Host,
    pub last_seen: LastSeen,
    pub snapclient: Snapclient,
}

/// A set of clients playing the same stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub muted: bool,
    #[serde(rename = "stream_id", alias = "streamId")]
    pub stream_id: String,
    pub clients: Vec<Client>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapserver {
    pub name: String,
    pub version: String,
    pub protocol_version: i64,
    pub control_protocol_version: i64,
}

/// Full server snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: Host,
    pub snapserver: Snapserver,
    pub groups: Vec<Group>,
    pub streams: Vec<Stream>,
}

impl Server {
    /// Find a group by id.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    /// Find a client by id across all groups.
    #[must_use]
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.groups
            .iter()
            .flat_map(|group| group.clients.iter())
            .find(|client| client.id == id)
    }

    /// Find a stream by id.
    #[must_use]
    pub fn stream(&self, id: &str) -> Option<&Stream> {
        self.streams.iter().find(|stream| stream.id == id)
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
