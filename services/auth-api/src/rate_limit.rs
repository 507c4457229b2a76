//! Per-IP rate limiting using the governor crate.
//!
//! Guards the Google sign-in endpoint, which accepts unauthenticated
//! requests that each cost a signature verification. The bucket map is
//! bounded: idle buckets are pruned periodically, and hitting the hard
//! cap evicts idle entries before inserting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::RwLock;
use vitta_auth_core::AuthError;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, governor::clock::DefaultClock>;

/// Hard cap on tracked addresses; only reachable under a distinct-IP flood
const MAX_TRACKED_IPS: usize = 10_000;

/// Idle window used when evicting at the cap
const EVICT_IDLE_WINDOW: Duration = Duration::from_secs(60);

/// One IP's limiter plus when it was last consulted
struct IpBucket {
    limiter: DirectLimiter,
    /// Milliseconds since `IpRateLimiter::started`
    last_seen_ms: AtomicU64,
}

/// Per-IP rate limiter
pub struct IpRateLimiter {
    buckets: RwLock<HashMap<IpAddr, Arc<IpBucket>>>,
    quota: Quota,
    started: Instant,
}

impl IpRateLimiter {
    /// Create a limiter allowing `per_minute` requests per IP per minute
    pub fn per_minute(per_minute: u32) -> Self {
        let cells = NonZeroU32::new(per_minute.max(1)).unwrap_or(NonZeroU32::MIN);
        Self {
            buckets: RwLock::new(HashMap::new()),
            quota: Quota::per_minute(cells),
            started: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Check whether a request from this IP is allowed
    pub async fn check(&self, ip: IpAddr) -> Result<(), AuthError> {
        let now_ms = self.now_ms();

        // Get or create the bucket for this IP
        let bucket = {
            let read_guard = self.buckets.read().await;
            if let Some(bucket) = read_guard.get(&ip) {
                bucket.clone()
            } else {
                drop(read_guard);

                let mut write_guard = self.buckets.write().await;
                // Double-check after acquiring write lock
                if let Some(bucket) = write_guard.get(&ip) {
                    bucket.clone()
                } else {
                    if write_guard.len() >= MAX_TRACKED_IPS {
                        let cutoff = now_ms.saturating_sub(EVICT_IDLE_WINDOW.as_millis() as u64);
                        write_guard
                            .retain(|_, b| b.last_seen_ms.load(Ordering::Relaxed) >= cutoff);
                    }
                    let bucket = Arc::new(IpBucket {
                        limiter: RateLimiter::direct(self.quota),
                        last_seen_ms: AtomicU64::new(now_ms),
                    });
                    write_guard.insert(ip, bucket.clone());
                    bucket
                }
            }
        };

        bucket.last_seen_ms.store(now_ms, Ordering::Relaxed);
        bucket.limiter.check().map_err(|_| {
            tracing::debug!(%ip, "rate limit exceeded");
            AuthError::RateLimited
        })
    }

    /// Drop buckets not consulted within `max_idle`. Returns the number
    /// dropped. An evicted bucket's IP simply starts fresh on its next
    /// request, which can only grant quota, never deny it early.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = self.now_ms().saturating_sub(max_idle.as_millis() as u64);
        let mut write_guard = self.buckets.write().await;
        let before = write_guard.len();
        write_guard.retain(|_, b| b.last_seen_ms.load(Ordering::Relaxed) >= cutoff);
        before - write_guard.len()
    }

    /// Number of IPs currently tracked
    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }
}
