//! Client configuration, built in code or parsed from environment variables.

use std::time::Duration;

use crate::rate_limit::{DEFAULT_BURST, DEFAULT_INTERVAL, RateLimiter};

pub const DEFAULT_HOST: &str = "127.0.0.1:1780";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fixed path of both the command endpoint and the notification endpoint.
pub const RPC_PATH: &str = "/jsonrpc";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Server address as `host:port`.
    pub host: String,
    /// Use `https`/`wss` instead of `http`/`ws`.
    pub secure: bool,
    /// Caller-supplied limiter. `None` means a fresh default limiter per client.
    pub rate_limiter: Option<RateLimiter>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ClientOptions {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            secure: false,
            rate_limiter: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build options from environment variables.
    ///
    /// Optional:
    /// - `SNAPCAST_HOST`: default `127.0.0.1:1780`
    /// - `SNAPCAST_SECURE`: `true`/`1` selects `https`/`wss`
    /// - `SNAPCAST_RATE_INTERVAL_MS`, `SNAPCAST_RATE_BURST`: custom limiter
    ///   (either one set replaces the default limiter)
    /// - `SNAPCAST_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SNAPCAST_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientOptions::from_env`] with an explicit variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("SNAPCAST_HOST")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let secure = lookup("SNAPCAST_SECURE").is_some_and(|v| parse_flag(&v));

        let interval_ms = lookup("SNAPCAST_RATE_INTERVAL_MS").and_then(|v| v.parse::<u64>().ok());
        let burst = lookup("SNAPCAST_RATE_BURST").and_then(|v| v.parse::<u32>().ok());
        let rate_limiter = (interval_ms.is_some() || burst.is_some()).then(|| {
            RateLimiter::new(
                interval_ms.map_or(DEFAULT_INTERVAL, Duration::from_millis),
                burst.unwrap_or(DEFAULT_BURST),
            )
        });

        let request_secs = parse_or(&lookup, "SNAPCAST_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS);
        let connect_secs = parse_or(&lookup, "SNAPCAST_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS);

        Self {
            host,
            secure,
            rate_limiter,
            request_timeout: Duration::from_secs(request_secs),
            connect_timeout: Duration::from_secs(connect_secs),
        }
    }

    /// URL of the command endpoint.
    #[must_use]
    pub fn command_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}{RPC_PATH}", self.host)
    }

    /// URL of the notification stream endpoint.
    #[must_use]
    pub fn stream_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{RPC_PATH}", self.host)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
