//! Retry/backoff state machine for page fetches
//!
//! States: `Attempting` → `Success` | `RetryWait` | `GiveUp`, and
//! `RetryWait` → `Attempting` with the next attempt index. Backoff formulas
//! are expressed in multiples of `backoff_unit` (one second in production).

use std::time::Duration;

use crate::infrastructure::http_client::TransportError;

/// Retry bound and backoff unit for one fetch call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    pub max_retries: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// Classified result of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Ok,
    RateLimited,
    Transport(TransportError),
    Status(u16),
}

impl AttemptOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => AttemptOutcome::Ok,
            429 => AttemptOutcome::RateLimited,
            other => AttemptOutcome::Status(other),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptOutcome::RateLimited | AttemptOutcome::Transport(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Attempting { attempt: u32 },
    RetryWait { next_attempt: u32, delay: Duration },
    Success,
    GiveUp,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_unit: Duration) -> Self {
        Self {
            max_retries,
            backoff_unit,
        }
    }

    /// Wait before retrying after `attempt` was rate limited: `5 + 2 * attempt` units
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(5 + 2 * attempt)
    }

    /// Wait before retrying after a transport error on `attempt`: `2 + attempt` units
    pub fn transport_backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(2 + attempt)
    }

    /// Transition out of `Attempting { attempt }` given what the attempt produced
    pub fn next_state(&self, attempt: u32, outcome: &AttemptOutcome) -> FetchState {
        let delay = match outcome {
            AttemptOutcome::Ok => return FetchState::Success,
            AttemptOutcome::Status(_) => return FetchState::GiveUp,
            AttemptOutcome::RateLimited => self.rate_limit_backoff(attempt),
            AttemptOutcome::Transport(_) => self.transport_backoff(attempt),
        };

        if attempt >= self.max_retries {
            return FetchState::GiveUp;
        }

        FetchState::RetryWait {
            next_attempt: attempt + 1,
            delay,
        }
    }
}
