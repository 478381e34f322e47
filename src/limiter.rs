use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::registry::now_secs;

/// Counter TTL: two hours, so a bucket outlives the hour it covers.
const COUNTER_TTL_SECS: u64 = 7200;

struct Counter {
    count: u32,
    expires_at: u64,
}

/// Hourly per-IP rate limiting for chat posts. Counters are keyed by
/// `(ip, hour bucket)` and expire passively like every other store here.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RwLock<HashMap<String, Counter>>>,
    limit: u32,
}

fn hour_bucket(now: u64) -> u64 {
    now / 3600
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            limit,
        }
    }

    /// Record one request from `ip` and report whether it is within the limit.
    /// The increment and the comparison happen under one write guard.
    pub async fn check(&self, ip: &str) -> bool {
        let now = now_secs();
        let key = format!("{ip}#{}", hour_bucket(now));
        let mut counters = self.inner.write().await;
        counters.retain(|_, c| c.expires_at > now);
        let counter = counters.entry(key).or_insert(Counter {
            count: 0,
            expires_at: now + COUNTER_TTL_SECS,
        });
        counter.count += 1;
        counter.count <= self.limit
    }
}
