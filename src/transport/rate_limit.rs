//! Token bucket rate limiter for outbound requests.
//!
//! Tokens refill lazily from elapsed time, so there is no background task.
//! Requests that find the bucket empty either fail fast or wait in a bounded
//! FIFO queue, depending on [`RateLimitConfig::queue_requests`].

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::config::RateLimitConfig;
use crate::core::AmegoError;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
    waiting: usize,
}

/// Snapshot of the limiter for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitStatus {
    pub tokens: f64,
    pub queue_length: usize,
}

/// Token bucket with burst capacity and a fair wait queue.
pub struct TokenBucket {
    capacity: f64,
    rate: f64,
    queue_requests: bool,
    max_queue_size: usize,
    state: Mutex<BucketState>,
    /// Fair mutex: waiters are served in arrival order.
    queue: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("capacity", &self.capacity)
            .field("rate", &self.rate)
            .field("status", &self.status())
            .finish()
    }
}

/// Releases a queue slot when the waiting future completes or is dropped.
struct QueueSlot<'a> {
    bucket: &'a TokenBucket,
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        let mut state = self.bucket.lock_state();
        state.waiting = state.waiting.saturating_sub(1);
    }
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst_size.max(1));
        Self {
            capacity,
            rate: config.requests_per_second,
            queue_requests: config.queue_requests,
            max_queue_size: config.max_queue_size,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
                waiting: 0,
            }),
            queue: tokio::sync::Mutex::new(()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now;
    }

    /// Time until one token is available, `ceil((1 - tokens) / rate)` in ms.
    fn wait_estimate(&self, tokens: f64) -> Duration {
        let millis = ((1.0 - tokens).max(0.0) / self.rate * 1000.0).ceil();
        Duration::from_millis(millis as u64)
    }

    /// Take a token without waiting. Fails if the bucket is empty or
    /// other requests are already queued.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock_state();
        self.refill(&mut state);
        if state.tokens >= 1.0 && state.waiting == 0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Take a token, waiting in FIFO order if queueing is enabled.
    ///
    /// Fails with [`AmegoError::RateLimitExceeded`] when queueing is off or
    /// the queue is full.
    pub async fn acquire(&self) -> Result<(), AmegoError> {
        {
            let mut state = self.lock_state();
            self.refill(&mut state);

            if state.tokens >= 1.0 && state.waiting == 0 {
                state.tokens -= 1.0;
                return Ok(());
            }

            if !self.queue_requests || state.waiting >= self.max_queue_size {
                return Err(AmegoError::RateLimitExceeded {
                    retry_after: self.wait_estimate(state.tokens),
                });
            }

            state.waiting += 1;
            debug!(waiting = state.waiting, "Rate limit reached, queueing request");
        }

        let _slot = QueueSlot { bucket: self };
        let _turn = self.queue.lock().await;

        loop {
            let wait = {
                let mut state = self.lock_state();
                self.refill(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(());
                }
                self.wait_estimate(state.tokens)
            };
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    /// Whether a request that finds the bucket empty would be queued
    /// rather than rejected.
    pub fn can_queue(&self) -> bool {
        self.queue_requests && self.lock_state().waiting < self.max_queue_size
    }

    pub fn status(&self) -> RateLimitStatus {
        let mut state = self.lock_state();
        self.refill(&mut state);
        RateLimitStatus {
            tokens: state.tokens,
            queue_length: state.waiting,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}
