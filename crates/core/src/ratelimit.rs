//! Token-bucket rate limiter shared by every request.
//!
//! One bucket is created at process start and injected into the admission
//! middleware; it is never reset. The decision is a single mutex-guarded
//! operation, so concurrent requests cannot observe a stale token count.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A token bucket with fixed capacity and a fixed refill rate of one token
/// per `refill` interval. The bucket starts full.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill: Duration,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill: Duration) -> Self {
        Self {
            capacity: f64::from(capacity),
            refill,
            inner: Mutex::new(Inner {
                tokens: f64::from(capacity),
                last: Instant::now(),
            }),
        }
    }

    /// Take one token if available. O(1), never blocks on anything but the
    /// state mutex.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(inner.last);
        if !self.refill.is_zero() {
            let refilled = elapsed.as_secs_f64() / self.refill.as_secs_f64();
            inner.tokens = (inner.tokens + refilled).min(self.capacity);
        }
        inner.last = now;

        if inner.tokens >= 1.0 {
            inner.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_up_to_capacity_then_rejects() {
        let bucket = TokenBucket::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert!(bucket.allow_at(now));
        assert!(bucket.allow_at(now));
        assert!(bucket.allow_at(now));
        assert!(!bucket.allow_at(now));
        assert!(!bucket.allow_at(now));
    }

    #[test]
    fn test_refill_grants_one_token_per_interval() {
        let bucket = TokenBucket::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(bucket.allow_at(now));
        assert!(!bucket.allow_at(now));

        // Half an interval is not enough for a whole token.
        assert!(!bucket.allow_at(now + Duration::from_secs(30)));

        assert!(bucket.allow_at(now + Duration::from_secs(61)));
        assert!(!bucket.allow_at(now + Duration::from_secs(61)));
    }

    #[test]
    fn test_idle_bucket_never_exceeds_capacity() {
        let bucket = TokenBucket::new(2, Duration::from_secs(1));
        let now = Instant::now();

        // A long idle period refills at most `capacity` tokens.
        let later = now + Duration::from_secs(3600);
        assert!(bucket.allow_at(later));
        assert!(bucket.allow_at(later));
        assert!(!bucket.allow_at(later));
    }

    #[test]
    fn test_non_monotonic_clock_is_safe() {
        let bucket = TokenBucket::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(bucket.allow_at(now + Duration::from_secs(120)));
        // An earlier timestamp must not panic or mint tokens.
        assert!(!bucket.allow_at(now));
    }
}
