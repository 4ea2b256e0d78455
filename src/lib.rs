//! Client engine for the Snapcast JSON-RPC control protocol.
//!
//! Two independent channels talk to one server:
//! - commands, one HTTP exchange each, rate limited per client
//!   ([`Client::send`], [`Client::call`]),
//! - the notification stream, a WebSocket whose pushed events are decoded
//!   and routed to caller-supplied channels ([`Client::listen`]).
//!
//! The wire types live in the [`envelope`] crate, re-exported here.

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod rate_limit;
pub mod request_id;
pub mod stream;

pub use client::Client;
pub use config::ClientOptions;
pub use connection::ConnectionState;
pub use dispatch::Notifications;
pub use error::{ClientError, StreamError};
pub use rate_limit::RateLimiter;
pub use stream::CloseSignal;

pub use envelope;
