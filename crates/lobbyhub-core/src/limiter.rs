//! Token-bucket rate limiter for publish operations.

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The waiter was cancelled before a token was granted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rate limit wait cancelled")]
pub struct AcquireCancelled;

#[derive(Debug)]
struct State {
    tokens: u64,
    last_refill: Instant,
}

/// Token bucket: a fixed burst capacity refilled one token per interval.
///
/// The bucket starts full. [`acquire`] consumes one token, waiting for a
/// refill when the bucket is empty, so callers are blocked rather than
/// rejected. Elapsed time is credited lazily on each acquire.
///
/// [`acquire`]: TokenBucket::acquire
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u64,
    interval: Duration,
    state: Mutex<State>,
}

impl TokenBucket {
    /// Create a full bucket with the given burst capacity and refill
    /// interval.
    #[must_use]
    pub fn new(capacity: u64, interval: Duration) -> Self {
        Self {
            capacity,
            interval,
            state: Mutex::new(State { tokens: capacity, last_refill: Instant::now() }),
        }
    }

    /// Take one token, waiting for a refill if none is available.
    ///
    /// Returns [`AcquireCancelled`] if `cancel` fires first; an abandoned
    /// wait consumes nothing.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AcquireCancelled> {
        loop {
            let wait_until = match self.try_take() {
                Ok(()) => return Ok(()),
                Err(next_refill) => next_refill,
            };

            tokio::select! {
                () = cancel.cancelled() => return Err(AcquireCancelled),
                () = tokio::time::sleep_until(wait_until) => {},
            }
        }
    }

    /// Take a token if one is available, otherwise report when the next
    /// refill lands.
    fn try_take(&self) -> Result<(), Instant> {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        let credit = (elapsed.as_nanos() / self.interval.as_nanos().max(1)) as u64;
        if credit > 0 {
            state.tokens = (state.tokens + credit).min(self.capacity);
            if state.tokens == self.capacity {
                state.last_refill = now;
            } else {
                state.last_refill += self.interval * u32::try_from(credit).unwrap_or(u32::MAX);
            }
        }

        if state.tokens > 0 {
            state.tokens -= 1;
            Ok(())
        } else {
            Err(state.last_refill + self.interval)
        }
    }
}
