//! Per-client token-bucket rate limiting

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use super::client_ip;
use crate::error::ApiError;

/// Burst allowance as a multiple of the sustained rate
const BURST_FACTOR: f64 = 2.0;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// Shared limiter keyed by client address
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    refill_per_second: f64,
    capacity: f64,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let refill_per_second = f64::from(requests_per_second.max(1));
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            refill_per_second,
            capacity: refill_per_second * BURST_FACTOR,
        }
    }

    /// Take one token for `client`; false when the bucket is empty
    pub async fn try_acquire(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(client.to_string()).or_insert(Bucket {
            tokens: self.capacity,
            refilled_at: now,
        });

        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_second).min(self.capacity);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets idle for longer than `max_idle`
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now.duration_since(bucket.refilled_at) < max_idle);
        before - buckets.len()
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request).unwrap_or_else(|| "unknown".to_string());

    if !limiter.try_acquire(&client).await {
        tracing::warn!(client = %client, "Rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_denied() {
        let limiter = RateLimiter::new(5);
        for _ in 0..10 {
            assert!(limiter.try_acquire("10.0.0.1").await);
        }
        assert!(!limiter.try_acquire("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.try_acquire("a").await);
        assert!(limiter.try_acquire("a").await);
        assert!(!limiter.try_acquire("a").await);
        assert!(limiter.try_acquire("b").await);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let limiter = RateLimiter::new(1);
        limiter.try_acquire("a").await;
        assert_eq!(limiter.evict_idle(Duration::from_secs(60)).await, 0);
        assert_eq!(limiter.evict_idle(Duration::ZERO).await, 1);
    }
}
