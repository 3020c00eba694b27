//! Per-address request counter with a reset once the window has elapsed.
//!
//! This is not a token bucket: after a reset the full allowance is
//! available again at once. Entries are never evicted, so the map grows
//! with the number of distinct addresses seen during the process lifetime.
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Visitor {
    count: u32,
    window_started: Instant,
}

pub struct RateLimiter {
    visitors: Mutex<HashMap<String, Visitor>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            visitors: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn check(&self, address: &str) -> RateLimitDecision {
        self.check_at(address, Instant::now())
    }

    /// Records one request from `address` at `now` and decides whether it
    /// may proceed. The whole read-modify-write happens under the lock.
    pub fn check_at(&self, address: &str, now: Instant) -> RateLimitDecision {
        let key = normalize_address(address);
        let mut visitors = self
            .visitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(visitor) = visitors.get_mut(key) else {
            visitors.insert(
                key.to_string(),
                Visitor {
                    count: 1,
                    window_started: now,
                },
            );
            return RateLimitDecision::Allowed;
        };

        if now.saturating_duration_since(visitor.window_started) > self.window {
            visitor.count = 0;
            visitor.window_started = now;
        }
        visitor.count = visitor.count.saturating_add(1);

        if visitor.count > self.max_requests {
            RateLimitDecision::Limited {
                retry_after: self.window,
            }
        } else {
            RateLimitDecision::Allowed
        }
    }

    /// Number of distinct addresses currently tracked.
    pub fn tracked_addresses(&self) -> usize {
        self.visitors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Strips a trailing `:port` from an address.
///
/// Bare IPv4/IPv6 addresses are returned unchanged and `[v6]:port` keeps
/// the address between the brackets.
pub fn normalize_address(address: &str) -> &str {
    let address = address.trim();
    if address.parse::<std::net::IpAddr>().is_ok() {
        return address;
    }
    if let Some(rest) = address.strip_prefix('[') {
        if let Some((host, _)) = rest.split_once(']') {
            return host;
        }
    }
    match address.rsplit_once(':') {
        Some((host, _)) => host,
        None => address,
    }
}
