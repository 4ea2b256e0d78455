//! Token-bucket rate limiting for outbound commands.
//!
//! DESIGN
//! ======
//! One bucket per client (or per caller-supplied limiter, shared by clone).
//! Capacity is `burst` tokens; one token is replenished every `interval`,
//! continuously rather than in steps. The bucket starts full.
//!
//! Acquisition is reservation-based: `acquire` takes a token immediately,
//! letting the balance go negative, and sleeps until that token would have
//! been refilled. Reservations are therefore granted in arrival order.
//! Dropping an `acquire` future before its token is due hands the token back.
//!
//! TIME
//! ====
//! All instants are `tokio::time::Instant` so tests can run on a paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_BURST: u32 = 10;

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone, Debug)]
pub struct RateLimiter {
    inner: Arc<Mutex<Bucket>>,
    interval: Duration,
    burst: u32,
}

#[derive(Debug)]
struct Bucket {
    /// Available tokens. Negative while reservations are outstanding.
    tokens: f64,
    /// Last time `tokens` was brought up to date.
    updated: Instant,
}

impl RateLimiter {
    /// One token per `interval`, at most `burst` tokens banked.
    ///
    /// A zero `interval` disables limiting. A `burst` of zero is raised to one.
    #[must_use]
    pub fn new(interval: Duration, burst: u32) -> Self {
        let burst = burst.max(1);
        Self {
            inner: Arc::new(Mutex::new(Bucket {
                tokens: f64::from(burst),
                updated: Instant::now(),
            })),
            interval,
            burst,
        }
    }

    /// Limiter that never waits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO, DEFAULT_BURST)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Wait until a token is available and take it.
    ///
    /// Cancel-safe: if the returned future is dropped before completing, the
    /// reserved token is returned to the bucket.
    pub async fn acquire(&self) {
        let now = Instant::now();
        let ready_at = self.reserve_at(now);
        if ready_at <= now {
            return;
        }
        let mut pending = PendingToken {
            limiter: self,
            armed: true,
        };
        tokio::time::sleep_until(ready_at).await;
        pending.armed = false;
    }

    /// Take a token only if one is available right now.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Tokens currently banked (negative while callers are queued).
    #[must_use]
    pub fn available(&self) -> f64 {
        let mut bucket = self.lock();
        self.refill(&mut bucket, Instant::now());
        bucket.tokens
    }

    /// Internal: reserve one token with an explicit timestamp (for testing).
    /// Returns the instant at which the reservation matures.
    fn reserve_at(&self, now: Instant) -> Instant {
        if self.interval.is_zero() {
            return now;
        }

        let mut bucket = self.lock();
        self.refill(&mut bucket, now);
        bucket.tokens -= 1.0;

        if bucket.tokens >= 0.0 {
            now
        } else {
            now + self.interval.mul_f64(-bucket.tokens)
        }
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        if self.interval.is_zero() {
            return true;
        }

        let mut bucket = self.lock();
        self.refill(&mut bucket, now);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Return a reservation that was abandoned before it matured.
    fn release(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut bucket = self.lock();
        bucket.tokens = (bucket.tokens + 1.0).min(f64::from(self.burst));
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        if self.interval.is_zero() {
            bucket.tokens = f64::from(self.burst);
            return;
        }
        let elapsed = now.saturating_duration_since(bucket.updated);
        let earned = elapsed.as_secs_f64() / self.interval.as_secs_f64();
        bucket.tokens = (bucket.tokens + earned).min(f64::from(self.burst));
        bucket.updated = bucket.updated.max(now);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Bucket> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_BURST)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Hands an unconsumed reservation back if `acquire` is cancelled mid-wait.
struct PendingToken<'a> {
    limiter: &'a RateLimiter,
    armed: bool,
}

impl Drop for PendingToken<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.limiter.release();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
