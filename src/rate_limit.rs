//! Per-IP sliding-window rate limiter (spec.md §4.9/§5), grounded in the
//! teacher's per-key `Mutex<HashMap<..., VecDeque<Instant>>>` window pattern.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
    window: Duration,
    max_requests: usize,
}

pub enum RateLimitOutcome {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateLimiter {
    pub fn new(window_secs: u64, max_requests: usize) -> Self {
        Self { windows: Mutex::new(HashMap::new()), window: Duration::from_secs(window_secs), max_requests }
    }

    /// Records an attempt for `ip` and reports whether it is allowed, per a
    /// 1-hour / 10-request sliding window.
    pub async fn check(&self, ip: IpAddr) -> RateLimitOutcome {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(ip).or_default();

        while let Some(oldest) = entry.front() {
            if now.duration_since(*oldest) > self.window {
                entry.pop_front();
            } else {
                break;
            }
        }

        if entry.len() >= self.max_requests {
            let oldest = *entry.front().expect("len >= max_requests > 0 implies non-empty");
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return RateLimitOutcome::Limited { retry_after_secs: retry_after.as_secs().max(1) };
        }

        entry.push_back(now);
        RateLimitOutcome::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn test_ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
    }

    #[tokio::test]
    async fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(3600, 10);
        let ip = test_ip();
        for _ in 0..10 {
            assert!(matches!(limiter.check(ip).await, RateLimitOutcome::Allowed));
        }
        match limiter.check(ip).await {
            RateLimitOutcome::Limited { retry_after_secs } => assert!(retry_after_secs > 0),
            RateLimitOutcome::Allowed => panic!("11th request should be rate limited"),
        }
    }

    #[tokio::test]
    async fn different_ips_have_independent_windows() {
        let limiter = RateLimiter::new(3600, 1);
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert!(matches!(limiter.check(a).await, RateLimitOutcome::Allowed));
        assert!(matches!(limiter.check(b).await, RateLimitOutcome::Allowed));
    }
}
