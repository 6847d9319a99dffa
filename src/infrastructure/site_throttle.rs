//! Per-site request spacing
//!
//! One keyed `governor` limiter per site family, keyed by request host.
//! Requests to the same host wait for the profile's minimum delay; requests to
//! different hosts never wait on each other.

use std::collections::HashMap;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::debug;

use crate::domain::SiteKind;
use crate::infrastructure::parsing::SiteProfiles;

type HostLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub struct SiteThrottle {
    limiters: HashMap<SiteKind, HostLimiter>,
}

impl SiteThrottle {
    /// Build limiters from each profile's minimum delay; a zero delay disables throttling
    pub fn from_profiles(profiles: &SiteProfiles) -> Self {
        let limiters = SiteKind::ALL
            .iter()
            .filter_map(|kind| {
                let delay = profiles.get(*kind).min_delay;
                Quota::with_period(delay).map(|quota| (*kind, RateLimiter::keyed(quota)))
            })
            .collect();
        Self { limiters }
    }

    /// Throttle that never waits
    pub fn unthrottled() -> Self {
        Self {
            limiters: HashMap::new(),
        }
    }

    pub fn is_throttled(&self, kind: SiteKind) -> bool {
        self.limiters.contains_key(&kind)
    }

    /// Wait until `host` may be requested again under `kind`'s delay
    pub async fn wait_turn(&self, kind: SiteKind, host: &str) {
        let Some(limiter) = self.limiters.get(&kind) else {
            return;
        };
        let key = host.to_ascii_lowercase();
        if limiter.check_key(&key).is_err() {
            debug!("⏳ Waiting for {} rate window on {}", kind, key);
            limiter.until_key_ready(&key).await;
        }
    }

    /// Drop per-host state whose delay has already elapsed
    pub fn retain_recent(&self) {
        for limiter in self.limiters.values() {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    /// Hosts currently tracked across all site families
    pub fn tracked_hosts(&self) -> usize {
        self.limiters.values().map(|limiter| limiter.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn profiles_with(delay_ms: u64) -> SiteProfiles {
        let overrides = SiteKind::ALL.iter().map(|kind| (*kind, delay_ms)).collect();
        SiteProfiles::builtin().unwrap().with_delay_overrides(&overrides)
    }

    #[tokio::test]
    async fn test_same_host_is_spaced() {
        let throttle = SiteThrottle::from_profiles(&profiles_with(150));
        let started = Instant::now();

        throttle.wait_turn(SiteKind::Generic, "shop.example").await;
        throttle.wait_turn(SiteKind::Generic, "shop.example").await;

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_different_hosts_do_not_wait() {
        let throttle = SiteThrottle::from_profiles(&profiles_with(2000));
        let started = Instant::now();

        throttle.wait_turn(SiteKind::Generic, "a.example").await;
        throttle.wait_turn(SiteKind::Generic, "b.example").await;
        throttle.wait_turn(SiteKind::Amazon, "www.amazon.com").await;

        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_retain_recent_forgets_idle_hosts() {
        let throttle = SiteThrottle::from_profiles(&profiles_with(50));
        throttle.wait_turn(SiteKind::Generic, "a.example").await;
        throttle.wait_turn(SiteKind::Generic, "b.example").await;
        assert_eq!(throttle.tracked_hosts(), 2);

        tokio::time::sleep(Duration::from_millis(120)).await;
        throttle.retain_recent();

        assert_eq!(throttle.tracked_hosts(), 0);
    }

    #[test]
    fn test_zero_delay_disables_throttle() {
        let throttle = SiteThrottle::from_profiles(&profiles_with(0));
        assert!(SiteKind::ALL.iter().all(|kind| !throttle.is_throttled(*kind)));
        assert!(!SiteThrottle::unthrottled().is_throttled(SiteKind::Amazon));
    }
}
