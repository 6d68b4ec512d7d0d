use std::sync::{Mutex, PoisonError};
use std::time::Instant;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket rate limiter for one direction of one PDN connection.
///
/// Tokens are topped up lazily on each call to `try_spend`, at `rate` tokens per second,
/// up to `capacity`.  The bucket starts full.
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(rate: u64, capacity: u64) -> Self {
        Self::new_at(rate, capacity, Instant::now())
    }

    fn new_at(rate: u64, capacity: u64, now: Instant) -> Self {
        TokenBucket {
            rate: rate as f64,
            capacity: capacity as f64,
            state: Mutex::new(BucketState {
                tokens: capacity as f64,
                last_refill: now,
            }),
        }
    }

    /// Refill, then take `amount` tokens if there are enough.  Returns whether the
    /// tokens were taken.
    pub fn try_spend(&self, amount: usize) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refill_and_spend(&mut state, self.rate, self.capacity, amount, Instant::now())
    }

    #[cfg(test)]
    fn try_spend_at(&self, amount: usize, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refill_and_spend(&mut state, self.rate, self.capacity, amount, now)
    }

    /// Current token level, as of the last call to `try_spend`.
    pub fn tokens(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    fn refill_and_spend(
        state: &mut BucketState,
        rate: f64,
        capacity: f64,
        amount: usize,
        now: Instant,
    ) -> bool {
        let elapsed = now.saturating_duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * rate).min(capacity);
        state.last_refill = state.last_refill.max(now);

        let amount = amount as f64;
        if state.tokens >= amount {
            state.tokens -= amount;
            true
        } else {
            false
        }
    }
}
