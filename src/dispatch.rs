//! Notification routing: typed fan-out of pushed events.
//!
//! DESIGN
//! ======
//! The read loop never delivers anything itself. It pushes every routable
//! frame (and every non-fatal error) onto an unbounded queue drained by a
//! single dispatch task, so a slow consumer stalls only delivery, never
//! reading, and events reach each channel in arrival order.
//!
//! For each notification the dispatcher:
//! 1. resolves the method against the notification catalogue (unknown → drop),
//! 2. drops the frame if the caller registered no channel for it, before any
//!    payload decoding,
//! 3. decodes `params` into the method's payload type (failure → error
//!    channel),
//! 4. sends the payload on the method's channel.
//!
//! A closed receiver is treated like an unregistered channel.

use envelope::notification::{
    ClientOnConnect, ClientOnDisconnect, ClientOnLatencyChanged, ClientOnNameChanged,
    ClientOnVolumeChanged, GroupOnMute, GroupOnNameChanged, GroupOnStreamChanged,
    ServerOnUpdate, StreamOnProperties, StreamOnUpdate,
};
use envelope::{Envelope, Notification, NotificationMethod};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::StreamError;

// =============================================================================
// REGISTRY
// =============================================================================

/// Caller-supplied delivery channels for one `listen` call.
///
/// Every field is optional; an absent channel means "not interested" and the
/// matching events are dropped without error.
#[derive(Clone, Debug, Default)]
pub struct Notifications {
    /// Non-fatal read and decode failures.
    pub errors: Option<mpsc::Sender<StreamError>>,
    pub client_on_connect: Option<mpsc::Sender<ClientOnConnect>>,
    pub client_on_disconnect: Option<mpsc::Sender<ClientOnDisconnect>>,
    pub client_on_volume_changed: Option<mpsc::Sender<ClientOnVolumeChanged>>,
    pub client_on_latency_changed: Option<mpsc::Sender<ClientOnLatencyChanged>>,
    pub client_on_name_changed: Option<mpsc::Sender<ClientOnNameChanged>>,
    pub group_on_mute: Option<mpsc::Sender<GroupOnMute>>,
    pub group_on_stream_changed: Option<mpsc::Sender<GroupOnStreamChanged>>,
    pub group_on_name_changed: Option<mpsc::Sender<GroupOnNameChanged>>,
    pub stream_on_update: Option<mpsc::Sender<StreamOnUpdate>>,
    pub stream_on_properties: Option<mpsc::Sender<StreamOnProperties>>,
    pub server_on_update: Option<mpsc::Sender<ServerOnUpdate>>,
}

impl Notifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a channel is registered for `method`.
    #[must_use]
    pub fn wants(&self, method: NotificationMethod) -> bool {
        match method {
            NotificationMethod::ClientOnConnect => self.client_on_connect.is_some(),
            NotificationMethod::ClientOnDisconnect => self.client_on_disconnect.is_some(),
            NotificationMethod::ClientOnVolumeChanged => self.client_on_volume_changed.is_some(),
            NotificationMethod::ClientOnLatencyChanged => self.client_on_latency_changed.is_some(),
            NotificationMethod::ClientOnNameChanged => self.client_on_name_changed.is_some(),
            NotificationMethod::GroupOnMute => self.group_on_mute.is_some(),
            NotificationMethod::GroupOnStreamChanged => self.group_on_stream_changed.is_some(),
            NotificationMethod::GroupOnNameChanged => self.group_on_name_changed.is_some(),
            NotificationMethod::StreamOnUpdate => self.stream_on_update.is_some(),
            NotificationMethod::StreamOnProperties => self.stream_on_properties.is_some(),
            NotificationMethod::ServerOnUpdate => self.server_on_update.is_some(),
        }
    }

    /// Route one notification envelope to its channel.
    pub(crate) async fn dispatch(&self, envelope: Envelope) {
        let Some(name) = envelope.method.as_deref() else {
            return;
        };
        let Some(method) = NotificationMethod::from_name(name) else {
            debug!(method = name, "dispatch: unknown notification dropped");
            return;
        };
        if !self.wants(method) {
            debug!(%method, "dispatch: no channel registered");
            return;
        }
        let Some(params) = envelope.params else {
            return;
        };

        match method {
            NotificationMethod::ClientOnConnect => self.deliver(self.client_on_connect.as_ref(), params).await,
            NotificationMethod::ClientOnDisconnect => self.deliver(self.client_on_disconnect.as_ref(), params).await,
            NotificationMethod::ClientOnVolumeChanged => {
                self.deliver(self.client_on_volume_changed.as_ref(), params).await;
            }
            NotificationMethod::ClientOnLatencyChanged => {
                self.deliver(self.client_on_latency_changed.as_ref(), params).await;
            }
            NotificationMethod::ClientOnNameChanged => {
                self.deliver(self.client_on_name_changed.as_ref(), params).await;
            }
            NotificationMethod::GroupOnMute => self.deliver(self.group_on_mute.as_ref(), params).await,
            NotificationMethod::GroupOnStreamChanged => {
                self.deliver(self.group_on_stream_changed.as_ref(), params).await;
            }
            NotificationMethod::GroupOnNameChanged => {
                self.deliver(self.group_on_name_changed.as_ref(), params).await;
            }
            NotificationMethod::StreamOnUpdate => self.deliver(self.stream_on_update.as_ref(), params).await,
            NotificationMethod::StreamOnProperties => {
                self.deliver(self.stream_on_properties.as_ref(), params).await;
            }
            NotificationMethod::ServerOnUpdate => self.deliver(self.server_on_update.as_ref(), params).await,
        }
    }

    /// Forward a non-fatal error to the error channel, if any.
    pub(crate) async fn report(&self, error: StreamError) {
        warn!(error = %error, "stream: non-fatal error");
        let Some(errors) = &self.errors else {
            return;
        };
        if errors.send(error).await.is_err() {
            debug!("dispatch: error receiver dropped");
        }
    }

    async fn deliver<T: Notification>(&self, channel: Option<&mpsc::Sender<T>>, params: Value) {
        let Some(channel) = channel else {
            return;
        };

        let payload = match envelope::parse_value::<T>(params) {
            Ok(payload) => payload,
            Err(source) => {
                self.report(StreamError::Payload {
                    method: T::METHOD,
                    source,
                })
                .await;
                return;
            }
        };

        if channel.send(payload).await.is_err() {
            debug!(method = %T::METHOD, "dispatch: receiver dropped");
        }
    }
}

// =============================================================================
// WORKER
// =============================================================================

/// Item handed from the read loop to the dispatch task.
#[derive(Debug)]
pub(crate) enum Inbound {
    Notification(Envelope),
    Error(StreamError),
}

/// Drain the queue in order until the read loop drops its sender.
pub(crate) async fn run(notifications: Notifications, mut queue: mpsc::UnboundedReceiver<Inbound>) {
    while let Some(inbound) = queue.recv().await {
        match inbound {
            Inbound::Notification(envelope) => notifications.dispatch(envelope).await,
            Inbound::Error(error) => notifications.report(error).await,
        }
    }
    debug!("dispatch: queue closed");
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
