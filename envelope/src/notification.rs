//! Typed payloads for every pushed notification.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::method::NotificationMethod;
use crate::model::{Client, Server, Stream, Volume};

/// A notification payload bound to the method that announces it.
pub trait Notification: DeserializeOwned {
    const METHOD: NotificationMethod;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOnConnect {
    pub id: String,
    pub client: Client,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOnDisconnect {
    pub id: String,
    pub client: Client,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOnVolumeChanged {
    pub id: String,
    pub volume: Volume,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOnLatencyChanged {
    pub id: String,
    pub latency: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOnNameChanged {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOnMute {
    pub id: String,
    pub mute: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOnStreamChanged {
    pub id: String,
    pub stream_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOnNameChanged {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOnUpdate {
    pub id: String,
    pub stream: Stream,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOnProperties {
    pub id: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOnUpdate {
    pub server: Server,
}

impl Notification for ClientOnConnect {
    const METHOD: NotificationMethod = NotificationMethod::ClientOnConnect;
}

impl Notification for ClientOnDisconnect {
    const METHOD: NotificationMethod = NotificationMethod::ClientOnDisconnect;
}

impl Notification for ClientOnVolumeChanged {
    const METHOD: NotificationMethod = NotificationMethod::ClientOnVolumeChanged;
}

impl Notification for ClientOnLatencyChanged {
    const METHOD: NotificationMethod = NotificationMethod::ClientOnLatencyChanged;
}

impl Notification for ClientOnNameChanged {
    const METHOD: NotificationMethod = NotificationMethod::ClientOnNameChanged;
}

impl Notification for GroupOnMute {
    const METHOD: NotificationMethod = NotificationMethod::GroupOnMute;
}

impl Notification for GroupOnStreamChanged {
    const METHOD: NotificationMethod = NotificationMethod::GroupOnStreamChanged;
}

impl Notification for GroupOnNameChanged {
    const METHOD: NotificationMethod = NotificationMethod::GroupOnNameChanged;
}

impl Notification for StreamOnUpdate {
    const METHOD: NotificationMethod = NotificationMethod::StreamOnUpdate;
}

impl Notification for StreamOnProperties {
    const METHOD: NotificationMethod = NotificationMethod::StreamOnProperties;
}

impl Notification for ServerOnUpdate {
    const METHOD: NotificationMethod = NotificationMethod::ServerOnUpdate;
}

#[cfg(test)]
#[path = "notification_test.rs"]
mod tests;
