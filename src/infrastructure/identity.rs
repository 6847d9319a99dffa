//! Outbound identity rotation
//!
//! Every fetch attempt draws a fresh user agent and, when the proxy snapshot
//! is non-empty, a proxy. Draws are independent and uniform; no state is kept
//! between calls.

use std::sync::Arc;

use crate::infrastructure::proxy_pool::ProxyPool;

/// Desktop and mobile user agents across the major browser families
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.4; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.6367.82 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/24.0 Chrome/117.0.0.0 Mobile Safari/537.36",
];

/// User agent and optional proxy used for one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub proxy: Option<String>,
}

impl Identity {
    /// Identity without a proxy, mostly useful in tests
    pub fn direct(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityRotator {
    user_agents: Arc<[String]>,
}

impl Default for IdentityRotator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityRotator {
    pub fn new() -> Self {
        Self {
            user_agents: USER_AGENTS.iter().map(|ua| (*ua).to_string()).collect(),
        }
    }

    /// Rotator over a custom pool; an empty pool falls back to the built-in one.
    pub fn with_user_agents(user_agents: Vec<String>) -> Self {
        if user_agents.is_empty() {
            return Self::new();
        }
        Self {
            user_agents: user_agents.into(),
        }
    }

    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }

    /// Draw a new identity from the user agent pool and the proxy snapshot
    pub fn next_identity(&self, proxies: &ProxyPool) -> Identity {
        let index = fastrand::usize(..self.user_agents.len());
        Identity {
            user_agent: self.user_agents[index].clone(),
            proxy: proxies.pick().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pool_covers_desktop_and_mobile() {
        assert!(USER_AGENTS.len() >= 8);
        assert!(USER_AGENTS.iter().any(|ua| ua.contains("Mobile")));
        assert!(USER_AGENTS.iter().any(|ua| ua.contains("Firefox")));
        assert!(USER_AGENTS.iter().any(|ua| ua.contains("Windows")));
    }

    #[test]
    fn test_without_proxies_identity_is_direct() {
        let rotator = IdentityRotator::new();
        let identity = rotator.next_identity(&ProxyPool::empty());

        assert!(identity.proxy.is_none());
        assert!(USER_AGENTS.contains(&identity.user_agent.as_str()));
    }

    #[test]
    fn test_proxy_drawn_from_snapshot() {
        let pool = ProxyPool::from_candidates(vec![
            "http://p1.example:8080".to_string(),
            "socks5://p2.example:1080".to_string(),
        ]);
        let rotator = IdentityRotator::new();

        let seen: HashSet<String> = (0..200)
            .filter_map(|_| rotator.next_identity(&pool).proxy)
            .collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_draws_vary_across_calls() {
        let rotator = IdentityRotator::new();
        let pool = ProxyPool::empty();
        let agents: HashSet<String> = (0..200)
            .map(|_| rotator.next_identity(&pool).user_agent)
            .collect();
        assert!(agents.len() > 1);
    }

    #[test]
    fn test_custom_pool() {
        let rotator = IdentityRotator::with_user_agents(vec!["agent/1".to_string()]);
        assert_eq!(rotator.next_identity(&ProxyPool::empty()).user_agent, "agent/1");
        assert_eq!(IdentityRotator::with_user_agents(vec![]).user_agents().len(), USER_AGENTS.len());
    }
}
