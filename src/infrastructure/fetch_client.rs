//! Fetch client: drives the retry state machine over a [`PageTransport`]
//!
//! Retries for one URL are strictly sequential. Every attempt waits for the
//! site's per-host spacing, draws a new identity and runs under its own
//! timeout, so a hung connection turns into a retry instead of a stuck worker.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::{FailureReason, SiteKind};
use crate::infrastructure::http_client::{PageTransport, TransportError};
use crate::infrastructure::identity::{Identity, IdentityRotator};
use crate::infrastructure::proxy_pool::ProxyPool;
use crate::infrastructure::retry_policy::{AttemptOutcome, FetchState, RetryPolicy};
use crate::infrastructure::site_throttle::SiteThrottle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Timed out on the last of {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("HTTP {status} is not retried")]
    HttpStatus { status: u16 },

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl FetchError {
    pub fn reason(&self) -> FailureReason {
        match self {
            FetchError::Timeout { .. } => FailureReason::Timeout,
            FetchError::HttpStatus { .. } | FetchError::RetriesExhausted { .. } => {
                FailureReason::FetchFailed
            }
        }
    }
}

/// One attempt within a fetch call
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    pub attempt: u32,
    pub identity: Identity,
    pub outcome: AttemptOutcome,
}

/// Successful fetch with the attempts it took
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
    pub attempts: Vec<FetchAttempt>,
}

impl FetchedPage {
    pub fn retries(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }
}

#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn PageTransport>,
    rotator: IdentityRotator,
    throttle: Arc<SiteThrottle>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl FetchClient {
    pub fn new(
        transport: Arc<dyn PageTransport>,
        rotator: IdentityRotator,
        throttle: Arc<SiteThrottle>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            rotator,
            throttle,
            policy,
            timeout,
        }
    }

    pub fn throttle(&self) -> &SiteThrottle {
        &self.throttle
    }

    /// Fetch `page_url` with the configured retry bound and timeout, spacing
    /// every attempt by `site`'s per-host delay
    pub async fn fetch(
        &self,
        page_url: &Url,
        site: SiteKind,
        proxies: &ProxyPool,
    ) -> Result<FetchedPage, FetchError> {
        let url = page_url.as_str();
        let mut history: Vec<FetchAttempt> = Vec::new();
        let mut body: Option<String> = None;
        let mut state = FetchState::Attempting { attempt: 0 };

        loop {
            state = match state {
                FetchState::Attempting { attempt } => {
                    if let Some(host) = page_url.host_str() {
                        self.throttle.wait_turn(site, host).await;
                    }
                    let identity = self.rotator.next_identity(proxies);
                    let (outcome, response_body) = self.attempt(url, &identity).await;
                    debug!("Attempt {} for {}: {:?}", attempt + 1, url, outcome);

                    let next = self.policy.next_state(attempt, &outcome);
                    body = response_body;
                    history.push(FetchAttempt {
                        attempt,
                        identity,
                        outcome,
                    });
                    next
                }
                FetchState::RetryWait {
                    next_attempt,
                    delay,
                } => {
                    warn!(
                        "🔄 Retrying {} in {:?} (retry {}/{})",
                        url, delay, next_attempt, self.policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    FetchState::Attempting {
                        attempt: next_attempt,
                    }
                }
                FetchState::Success => {
                    info!("✅ Fetched {} after {} attempt(s)", url, history.len());
                    return Ok(FetchedPage {
                        url: url.to_string(),
                        body: body.take().unwrap_or_default(),
                        attempts: history,
                    });
                }
                FetchState::GiveUp => {
                    let err = give_up_error(&history);
                    error!("❌ Fetch failed for {}: {}", url, err);
                    return Err(err);
                }
            };
        }
    }

    async fn attempt(&self, url: &str, identity: &Identity) -> (AttemptOutcome, Option<String>) {
        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.transport.get(url, identity, timeout)).await {
            Ok(Ok(response)) => {
                let outcome = AttemptOutcome::from_status(response.status);
                let body = (outcome == AttemptOutcome::Ok).then_some(response.body);
                (outcome, body)
            }
            Ok(Err(e)) => (AttemptOutcome::Transport(e), None),
            Err(_) => (
                AttemptOutcome::Transport(TransportError::Timeout(timeout)),
                None,
            ),
        }
    }
}

fn give_up_error(history: &[FetchAttempt]) -> FetchError {
    let attempts = history.len() as u32;
    match history.last().map(|attempt| &attempt.outcome) {
        Some(AttemptOutcome::Status(status)) => FetchError::HttpStatus { status: *status },
        Some(AttemptOutcome::Transport(e)) if e.is_timeout() => FetchError::Timeout { attempts },
        Some(AttemptOutcome::Transport(e)) => FetchError::RetriesExhausted {
            attempts,
            last: e.to_string(),
        },
        Some(AttemptOutcome::RateLimited) => FetchError::RetriesExhausted {
            attempts,
            last: "HTTP 429 Too Many Requests".to_string(),
        },
        Some(AttemptOutcome::Ok) | None => FetchError::RetriesExhausted {
            attempts,
            last: "no attempt completed".to_string(),
        },
    }
}
