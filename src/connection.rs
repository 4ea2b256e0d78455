//! Notification stream connection lifecycle.
//!
//! LIFECYCLE
//! =========
//! `Idle` → `Connecting` → `Connected` → `Closed`, and `Closed` → `Connecting`
//! again on the next `listen`. A failed dial falls back to the state it
//! started from. There is no way back to `Idle`.
//!
//! The write half of the socket lives here so `close` can send the
//! normal-closure frame while the read loop owns the read half. Exactly one
//! read loop exists per connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::ClientError;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;

/// Upper bound on flushing the closing handshake of a finished stream, and
/// on waiting for the server's reply after a requested close.
pub(crate) const RELEASE_TIMEOUT: Duration = Duration::from_secs(2);

/// Observable state of the notification stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, never dialed.
    Idle,
    /// A `listen` dial is in flight.
    Connecting,
    /// Dial succeeded and the read loop is running.
    Connected,
    /// The stream ended, by either side.
    Closed,
}

pub(crate) struct Connection {
    live: Mutex<Option<Live>>,
    state: watch::Sender<ConnectionState>,
    generation: AtomicU64,
}

/// Write half of the current socket plus its close flag.
struct Live {
    sink: WsSink,
    close: Arc<CloseRequest>,
}

/// Set once by `close`; the read loop is the only waiter.
#[derive(Debug, Default)]
struct CloseRequest {
    flag: AtomicBool,
    notify: Notify,
}

/// What the read loop needs to know about the connection it serves.
#[derive(Clone, Debug)]
pub(crate) struct Session {
    pub(crate) generation: u64,
    close: Arc<CloseRequest>,
}

impl Session {
    /// True once the caller has asked for this connection to close.
    pub(crate) fn close_requested(&self) -> bool {
        self.close.flag.load(Ordering::SeqCst)
    }

    /// Resolves when the caller asks for this connection to close. A request
    /// made while nobody was waiting is remembered.
    pub(crate) async fn requested(&self) {
        self.close.notify.notified().await;
    }
}

impl Connection {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            live: Mutex::new(None),
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Claim the right to dial. Returns the state to restore if the dial fails.
    pub(crate) fn begin(&self) -> Result<ConnectionState, ClientError> {
        let mut previous = ConnectionState::Idle;
        let claimed = self.state.send_if_modified(|state| match *state {
            ConnectionState::Connecting | ConnectionState::Connected => false,
            ConnectionState::Idle | ConnectionState::Closed => {
                previous = *state;
                *state = ConnectionState::Connecting;
                true
            }
        });

        if claimed {
            Ok(previous)
        } else {
            Err(ClientError::AlreadyListening)
        }
    }

    /// Undo [`Connection::begin`] after a failed dial.
    pub(crate) fn abort(&self, previous: ConnectionState) {
        self.state.send_replace(previous);
    }

    /// Install a freshly dialed socket's write half.
    pub(crate) async fn attach(&self, sink: WsSink) -> Session {
        let mut live = self.live.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let close = Arc::new(CloseRequest::default());
        *live = Some(Live {
            sink,
            close: Arc::clone(&close),
        });
        self.state.send_replace(ConnectionState::Connected);
        Session { generation, close }
    }

    /// Send a normal-closure frame, then release the socket.
    pub(crate) async fn close(&self) -> Result<(), ClientError> {
        let mut slot = self.live.lock().await;
        let Some(Live { mut sink, close }) = slot.take() else {
            return Err(ClientError::NotConnected);
        };

        close.flag.store(true, Ordering::SeqCst);
        close.notify.notify_one();
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        let sent = sink.send(Message::Close(Some(frame))).await;
        drop(sink);
        self.state.send_replace(ConnectionState::Closed);

        sent.map_err(|e| ClientError::Close(Box::new(e)))?;
        info!("stream: close requested");
        Ok(())
    }

    /// Called by the read loop once it stops. Flushes any pending close
    /// handshake reply and marks the connection closed, unless a newer
    /// connection has already replaced this one. Only `Connected` moves to
    /// `Closed`; a `listen` dialing after a caller close keeps `Connecting`.
    pub(crate) async fn finish(&self, session: &Session) {
        let mut slot = self.live.lock().await;
        if self.generation.load(Ordering::SeqCst) != session.generation {
            return;
        }
        if let Some(Live { mut sink, .. }) = slot.take() {
            match tokio::time::timeout(RELEASE_TIMEOUT, sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "stream: socket release after close"),
                Err(_) => debug!("stream: socket release timed out"),
            }
        }
        self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connected {
                *state = ConnectionState::Closed;
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
