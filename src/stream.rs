//! Notification stream: dial, read loop, close signal.
//!
//! DESIGN
//! ======
//! `listen` dials the stream endpoint, splits the socket, parks the write
//! half in [`Connection`] and spawns two tasks:
//! - the read loop, which classifies every inbound item and queues
//!   notifications and non-fatal errors without ever waiting on a consumer,
//! - the dispatch worker, which drains that queue in order.
//!
//! LIFECYCLE
//! =========
//! 1. `listen` → `Connecting` → dial → `Connected`, returns a [`CloseSignal`]
//! 2. Frames → classify → queue → dispatch worker → caller channels
//! 3. Close frame, end of stream, or read error → loop ends. The socket
//!    yields nothing after any read error, so a reported error is also the
//!    one the stream ends with.
//! 4. Socket released → `Closed` → close signal resolves exactly once
//!
//! A close frame with code 1000 or 1001, or any ending after the caller
//! asked for the close, resolves the signal with `Ok(())`. Everything else
//! resolves it with the error that ended the loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::SplitStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use envelope::Envelope;

use crate::connection::{Connection, RELEASE_TIMEOUT, Session, WsStream};
use crate::dispatch::{self, Inbound, Notifications};
use crate::error::{ClientError, StreamError, is_terminal_read_error};

// =============================================================================
// CLOSE SIGNAL
// =============================================================================

/// Resolves once, when the notification stream ends.
#[derive(Debug)]
pub struct CloseSignal {
    rx: oneshot::Receiver<Result<(), StreamError>>,
}

impl CloseSignal {
    /// Wait for the stream to end. `Ok(())` means a normal closure.
    ///
    /// # Errors
    ///
    /// Returns the [`StreamError`] that ended the stream abnormally.
    pub async fn wait(self) -> Result<(), StreamError> {
        self.rx.await.unwrap_or(Ok(()))
    }
}

// =============================================================================
// LISTEN
// =============================================================================

pub(crate) struct Dial<'a> {
    pub url: String,
    pub host: &'a str,
    pub connect_timeout: Duration,
}

/// Open the stream and start delivering to `notifications`.
pub(crate) async fn listen(
    connection: &Arc<Connection>,
    dial: Dial<'_>,
    notifications: Notifications,
) -> Result<CloseSignal, ClientError> {
    let previous = connection.begin()?;

    let socket = match connect(&dial).await {
        Ok(socket) => socket,
        Err(source) => {
            connection.abort(previous);
            warn!(host = dial.host, error = %source, "stream: dial failed");
            return Err(ClientError::Dial {
                host: dial.host.to_owned(),
                source: Box::new(source),
            });
        }
    };

    let (sink, stream) = socket.split();
    let session = connection.attach(sink).await;
    info!(host = dial.host, generation = session.generation, "stream: connected");

    let (queue_tx, queue_rx) = mpsc::unbounded_channel();
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(dispatch::run(notifications, queue_rx));
    tokio::spawn(read_loop(stream, Arc::clone(connection), session, queue_tx, done_tx));

    Ok(CloseSignal { rx: done_rx })
}

async fn connect(dial: &Dial<'_>) -> Result<WsStream, tungstenite::Error> {
    match tokio::time::timeout(dial.connect_timeout, connect_async(dial.url.as_str())).await {
        Ok(Ok((socket, _response))) => Ok(socket),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(tungstenite::Error::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            "stream dial timed out",
        ))),
    }
}

// =============================================================================
// READ LOOP
// =============================================================================

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    connection: Arc<Connection>,
    session: Session,
    queue: mpsc::UnboundedSender<Inbound>,
    done: oneshot::Sender<Result<(), StreamError>>,
) {
    // Last reported read error; the socket ends right after one.
    let mut failed_read: Option<Arc<tungstenite::Error>> = None;

    let outcome = loop {
        let item = if session.close_requested() {
            // Waiting on the server's close reply; give up after a bound.
            tokio::time::timeout(RELEASE_TIMEOUT, stream.next())
                .await
                .unwrap_or(None)
        } else {
            tokio::select! {
                item = stream.next() => item,
                () = session.requested() => continue,
            }
        };

        match classify(item, session.close_requested()) {
            Step::Frame(envelope) => {
                failed_read = None;
                if queue.send(Inbound::Notification(envelope)).is_err() {
                    debug!("stream: dispatch worker gone");
                }
            }
            Step::Skip => failed_read = None,
            Step::Report(error) => {
                failed_read = match &error {
                    StreamError::Read(e) => Some(Arc::clone(e)),
                    _ => None,
                };
                if queue.send(Inbound::Error(error)).is_err() {
                    debug!("stream: dispatch worker gone");
                }
            }
            Step::Finish(outcome) => break settle(outcome, failed_read.take()),
        }
    };

    drop(queue);
    connection.finish(&session).await;

    match &outcome {
        Ok(()) => info!(generation = session.generation, "stream: closed"),
        Err(e) => warn!(generation = session.generation, error = %e, "stream: terminated"),
    }
    if done.send(outcome).is_err() {
        debug!("stream: close signal dropped by caller");
    }
}

/// An end of stream right after a read error is that error, not an EOF.
pub(crate) fn settle(
    outcome: Result<(), StreamError>,
    failed_read: Option<Arc<tungstenite::Error>>,
) -> Result<(), StreamError> {
    match (outcome, failed_read) {
        (Err(StreamError::UnexpectedEof), Some(error)) => Err(StreamError::Read(error)),
        (outcome, _) => outcome,
    }
}

/// What the read loop does with one item from the socket.
#[derive(Debug)]
pub(crate) enum Step {
    /// A notification to queue for dispatch.
    Frame(Envelope),
    /// Nothing to deliver: control frames, responses, unroutable envelopes.
    Skip,
    /// A non-fatal error for the caller's error channel.
    Report(StreamError),
    /// The stream is over.
    Finish(Result<(), StreamError>),
}

/// Classify one socket item. `close_requested` turns any ending into a
/// normal one.
pub(crate) fn classify(
    item: Option<Result<Message, tungstenite::Error>>,
    close_requested: bool,
) -> Step {
    let finish = |error: StreamError| {
        if close_requested {
            Step::Finish(Ok(()))
        } else {
            Step::Finish(Err(error))
        }
    };

    match item {
        None => finish(StreamError::UnexpectedEof),
        Some(Ok(Message::Text(text))) => decode(text.as_bytes()),
        Some(Ok(Message::Binary(bytes))) => decode(&bytes),
        Some(Ok(Message::Close(frame))) => match frame {
            None => Step::Finish(Ok(())),
            Some(frame) if matches!(frame.code, CloseCode::Normal | CloseCode::Away) => Step::Finish(Ok(())),
            Some(frame) => finish(StreamError::Closed {
                code: u16::from(frame.code),
                reason: frame.reason.as_str().to_owned(),
            }),
        },
        Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => Step::Skip,
        Some(Err(e)) if is_terminal_read_error(&e) => finish(StreamError::Read(Arc::new(e))),
        Some(Err(e)) => Step::Report(StreamError::Read(Arc::new(e))),
    }
}

fn decode(bytes: &[u8]) -> Step {
    match envelope::decode_envelope(bytes) {
        Ok(envelope) if envelope.is_notification() => Step::Frame(envelope),
        Ok(envelope) => {
            debug!(id = ?envelope.id, "stream: non-notification frame skipped");
            Step::Skip
        }
        Err(e) => Step::Report(StreamError::Decode(e)),
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
