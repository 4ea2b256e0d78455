//! Closed method catalogues.
//!
//! Commands and notifications are disjoint namespaces. A frame's transport
//! tells which catalogue applies: command responses never carry a method,
//! stream frames are matched against [`NotificationMethod`] only.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// COMMAND METHODS
// =============================================================================

/// Client-initiated command methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    ClientGetStatus,
    ClientSetVolume,
    ClientSetLatency,
    ClientSetName,
    GroupGetStatus,
    GroupSetMute,
    GroupSetStream,
    GroupSetClients,
    GroupSetName,
    ServerGetRpcVersion,
    ServerGetStatus,
    ServerDeleteClient,
    StreamAddStream,
    StreamRemoveStream,
    StreamControl,
    StreamSetProperty,
}

impl Method {
    /// Every command method, in catalogue order.
    pub const ALL: [Self; 16] = [
        Self::ClientGetStatus,
        Self::ClientSetVolume,
        Self::ClientSetLatency,
        Self::ClientSetName,
        Self::GroupGetStatus,
        Self::GroupSetMute,
        Self::GroupSetStream,
        Self::GroupSetClients,
        Self::GroupSetName,
        Self::ServerGetRpcVersion,
        Self::ServerGetStatus,
        Self::ServerDeleteClient,
        Self::StreamAddStream,
        Self::StreamRemoveStream,
        Self::StreamControl,
        Self::StreamSetProperty,
    ];

    /// Wire name, e.g. `"Client.SetVolume"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientGetStatus => "Client.GetStatus",
            Self::ClientSetVolume => "Client.SetVolume",
            Self::ClientSetLatency => "Client.SetLatency",
            Self::ClientSetName => "Client.SetName",
            Self::GroupGetStatus => "Group.GetStatus",
            Self::GroupSetMute => "Group.SetMute",
            Self::GroupSetStream => "Group.SetStream",
            Self::GroupSetClients => "Group.SetClients",
            Self::GroupSetName => "Group.SetName",
            Self::ServerGetRpcVersion => "Server.GetRPCVersion",
            Self::ServerGetStatus => "Server.GetStatus",
            Self::ServerDeleteClient => "Server.DeleteClient",
            Self::StreamAddStream => "Stream.AddStream",
            Self::StreamRemoveStream => "Stream.RemoveStream",
            Self::StreamControl => "Stream.Control",
            Self::StreamSetProperty => "Stream.SetProperty",
        }
    }

    /// Look up a command method by its exact wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown command method `{name}`")))
    }
}

// =============================================================================
// NOTIFICATION METHODS
// =============================================================================

/// Server-initiated event methods pushed over the notification stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationMethod {
    ClientOnConnect,
    ClientOnDisconnect,
    ClientOnVolumeChanged,
    ClientOnLatencyChanged,
    ClientOnNameChanged,
    GroupOnMute,
    GroupOnStreamChanged,
    GroupOnNameChanged,
    StreamOnUpdate,
    StreamOnProperties,
    ServerOnUpdate,
}

impl NotificationMethod {
    /// Every notification method, in catalogue order.
    pub const ALL: [Self; 11] = [
        Self::ClientOnConnect,
        Self::ClientOnDisconnect,
        Self::ClientOnVolumeChanged,
        Self::ClientOnLatencyChanged,
        Self::ClientOnNameChanged,
        Self::GroupOnMute,
        Self::GroupOnStreamChanged,
        Self::GroupOnNameChanged,
        Self::StreamOnUpdate,
        Self::StreamOnProperties,
        Self::ServerOnUpdate,
    ];

    /// Wire name, e.g. `"Client.OnVolumeChanged"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientOnConnect => "Client.OnConnect",
            Self::ClientOnDisconnect => "Client.OnDisconnect",
            Self::ClientOnVolumeChanged => "Client.OnVolumeChanged",
            Self::ClientOnLatencyChanged => "Client.OnLatencyChanged",
            Self::ClientOnNameChanged => "Client.OnNameChanged",
            Self::GroupOnMute => "Group.OnMute",
            Self::GroupOnStreamChanged => "Group.OnStreamChanged",
            Self::GroupOnNameChanged => "Group.OnNameChanged",
            Self::StreamOnUpdate => "Stream.OnUpdate",
            Self::StreamOnProperties => "Stream.OnProperties",
            Self::ServerOnUpdate => "Server.OnUpdate",
        }
    }

    /// Look up a notification method by its exact wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

impl std::fmt::Display for NotificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NotificationMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown notification method `{name}`"))
        })
    }
}

#[cfg(test)]
#[path = "method_test.rs"]
mod tests;
