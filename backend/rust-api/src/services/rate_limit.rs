use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_RATE_LIMIT: usize = 30; // requests per window
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window counter keyed by user id.
pub trait RateLimitStore: Send + Sync {
    /// Records a hit and returns whether the request is within the limit.
    fn check(&self, key: &str) -> bool;
}

pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT, RATE_WINDOW)
    }
}

impl RateLimitStore for SlidingWindowLimiter {
    fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        let window = hits.entry(key.to_string()).or_default();

        while let Some(front) = window.front() {
            if now.duration_since(*front) >= self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.limit {
            return false;
        }

        window.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_within_limit_pass() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("u1"));
        assert!(limiter.check("u1"));
        assert!(limiter.check("u1"));
    }

    #[test]
    fn test_request_over_limit_rejected() {
        let limiter = SlidingWindowLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("u1"));
        }
        assert!(!limiter.check("u1"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("u1"));
        assert!(!limiter.check("u1"));
        assert!(limiter.check("u2"));
    }

    #[test]
    fn test_window_rolls_over() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_millis(30));
        assert!(limiter.check("u1"));
        assert!(limiter.check("u1"));
        assert!(!limiter.check("u1"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.check("u1"));
    }
}
