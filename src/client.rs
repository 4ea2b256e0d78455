//! The client handle: command transport plus notification stream control.
//!
//! DESIGN
//! ======
//! Commands and the notification stream are independent. Every command is
//! one HTTP `POST` to the command endpoint, gated by the client's rate
//! limiter, and its response comes back on that same exchange. The stream is
//! a separate WebSocket opened by [`Client::listen`]; `send` works in any
//! stream state.
//!
//! `send` returns the response envelope verbatim, protocol-level `error`
//! included. [`Client::call`] is the typed layer on top: it turns an embedded
//! error into [`ClientError::Rpc`] and decodes `result` into the command's
//! response type.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use envelope::{Command, Envelope, Method};

use crate::config::ClientOptions;
use crate::connection::{Connection, ConnectionState};
use crate::dispatch::Notifications;
use crate::error::ClientError;
use crate::rate_limit::RateLimiter;
use crate::request_id::RequestCounter;
use crate::stream::{self, CloseSignal, Dial};

const JSON: &str = "application/json";

pub struct Client {
    http: reqwest::Client,
    options: ClientOptions,
    limiter: RateLimiter,
    requests: RequestCounter,
    connection: Arc<Connection>,
}

impl Client {
    /// Build a client for `options.host`.
    ///
    /// Uses the caller's rate limiter when one is supplied, otherwise a
    /// default limiter owned by this client alone.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(ClientError::HttpClientBuild)?;
        let limiter = options.rate_limiter.clone().unwrap_or_default();

        Ok(Self {
            http,
            options,
            limiter,
            requests: RequestCounter::new(),
            connection: Arc::new(Connection::new()),
        })
    }

    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The limiter gating this client's commands.
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The id assigned to the most recent command, 0 before the first.
    #[must_use]
    pub fn last_request_id(&self) -> u64 {
        self.requests.last_id()
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Issue one command and return the server's response envelope.
    ///
    /// A protocol-level error in the response is returned inside the
    /// envelope, not as `Err`. Dropping the future while it waits for a
    /// rate-limit token gives the token back.
    ///
    /// # Errors
    ///
    /// Transport failure, non-success HTTP status, or an undecodable body.
    pub async fn send<P>(&self, method: Method, params: &P) -> Result<Envelope, ClientError>
    where
        P: Serialize + ?Sized,
    {
        let id = self.requests.next_id();
        self.limiter.acquire().await;

        let request = Envelope::request(id, method, envelope::to_value(params)?);
        let body = envelope::encode_envelope(&request)?;
        debug!(%method, id, "command: send");

        let response = self
            .http
            .post(self.options.command_url())
            .header(ACCEPT, HeaderValue::from_static(JSON))
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%method, id, status = status.as_u16(), "command: rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
                text: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(envelope::decode_envelope(&bytes)?)
    }

    /// [`Client::send`] bounded by `timeout`, limiter wait included.
    ///
    /// # Errors
    ///
    /// [`ClientError::Timeout`] if the deadline passes first, otherwise as
    /// [`Client::send`].
    pub async fn send_with_timeout<P>(
        &self,
        method: Method,
        params: &P,
        timeout: Duration,
    ) -> Result<Envelope, ClientError>
    where
        P: Serialize + ?Sized,
    {
        tokio::time::timeout(timeout, self.send(method, params))
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    /// Issue a typed command and decode its result.
    ///
    /// # Errors
    ///
    /// As [`Client::send`], plus [`ClientError::Rpc`] for a protocol-level
    /// error and [`ClientError::Codec`] for a result of the wrong shape.
    pub async fn call<C: Command>(&self, command: &C) -> Result<C::Response, ClientError> {
        let mut response = self.send(C::METHOD, command).await?;
        if let Some(error) = response.error.take() {
            return Err(ClientError::Rpc(error));
        }
        Ok(response.parse_result::<C::Response>()?)
    }

    // =========================================================================
    // NOTIFICATION STREAM
    // =========================================================================

    /// Open the notification stream and deliver events to `notifications`.
    ///
    /// Returns once the stream is connected. The returned signal resolves
    /// when the stream ends.
    ///
    /// # Errors
    ///
    /// [`ClientError::AlreadyListening`] while a stream is open or opening,
    /// [`ClientError::Dial`] if the connection cannot be established.
    pub async fn listen(&self, notifications: Notifications) -> Result<CloseSignal, ClientError> {
        let dial = Dial {
            url: self.options.stream_url(),
            host: &self.options.host,
            connect_timeout: self.options.connect_timeout,
        };
        stream::listen(&self.connection, dial, notifications).await
    }

    /// Send a normal-closure frame and release the stream.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotConnected`] without a live stream,
    /// [`ClientError::Close`] if the close frame cannot be written.
    pub async fn close(&self) -> Result<(), ClientError> {
        self.connection.close().await
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Subscribe to stream state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.options.host)
            .field("secure", &self.options.secure)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
