//! Error types surfaced by the client.
//!
//! `ClientError` is returned synchronously from `send`, `call`, `listen` and
//! `close`. `StreamError` is what the notification stream reports: either on
//! the caller's error channel (non-fatal) or through the close signal
//! (terminal).

use std::sync::Arc;

use envelope::{CodecError, NotificationMethod, RpcError};
use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(#[source] reqwest::Error),

    /// The command exchange failed at the network level.
    #[error("command request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered a command with a non-success HTTP status.
    #[error("command rejected: {status} {text}")]
    Status { status: u16, text: String },

    /// A command or response envelope could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The command did not complete before its deadline.
    #[error("timed out waiting for command response")]
    Timeout,

    /// The notification stream could not be opened.
    #[error("failed to connect to snapcast at '{host}': {source}")]
    Dial {
        host: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    /// `listen` was called while a stream is already open or opening.
    #[error("notification stream already open")]
    AlreadyListening,

    /// `close` was called without a live notification stream.
    #[error("notification stream not connected")]
    NotConnected,

    /// The normal-closure frame could not be written.
    #[error("failed to write close message to snapcast: {0}")]
    Close(#[source] Box<tungstenite::Error>),

    /// The server answered a typed call with a protocol-level error.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A frame could not be read from the stream socket. Shared because the
    /// same failure is both reported and used to end the stream.
    #[error("stream read failed: {0}")]
    Read(#[source] Arc<tungstenite::Error>),

    /// A frame was read but is not an envelope.
    #[error("stream frame decode failed: {0}")]
    Decode(#[source] CodecError),

    /// A notification's params do not match the payload type of its method.
    #[error("{method} payload decode failed: {source}")]
    Payload {
        method: NotificationMethod,
        #[source]
        source: CodecError,
    },

    /// The server closed the stream with a non-normal close code.
    #[error("stream closed by server: {code} {reason}")]
    Closed { code: u16, reason: String },

    /// The connection ended without a close handshake.
    #[error("stream ended unexpectedly")]
    UnexpectedEof,
}

impl StreamError {
    /// True for errors that end the read loop as soon as they are read.
    ///
    /// Other read errors are reported first, but the socket yields nothing
    /// after any error, so they end the stream too.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::UnexpectedEof) || self.is_connection_lost()
    }

    fn is_connection_lost(&self) -> bool {
        let Self::Read(error) = self else {
            return false;
        };
        is_terminal_read_error(error)
    }
}

/// Read failures after which the socket cannot produce further frames.
pub(crate) fn is_terminal_read_error(error: &tungstenite::Error) -> bool {
    matches!(
        error,
        tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Io(_)
            | tungstenite::Error::Protocol(_)
    )
}
