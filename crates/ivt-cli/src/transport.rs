//! Resilient transport
//!
//! Wraps a single record-store call with bounded retries and exponential
//! backoff. Rate limiting (HTTP 429) and network-level failures are retried;
//! any other failure is returned immediately. Every call gets a fresh
//! [`RetryState`], so the transport itself carries no state between calls.
//!
//! With the default policy a persistently rate-limited call is attempted four
//! times, sleeping 1s, 2s, and 4s in between, before the last 429 is returned.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry, in milliseconds
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// HTTP status the store uses to signal rate limiting
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Failure of one store call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Status 429: {body}")]
    RateLimited { body: String },

    #[error("Status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status == RATE_LIMIT_STATUS {
            TransportError::RateLimited { body }
        } else {
            TransportError::Status { status, body }
        }
    }

    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::RateLimited { .. } | TransportError::Network(_)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::RateLimited { .. } => Some(RATE_LIMIT_STATUS),
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Retry bound and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles after every retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Bookkeeping for one transport call
#[derive(Debug, Clone, Copy)]
pub struct RetryState {
    remaining: u32,
    delay: Duration,
    attempts: u32,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            remaining: policy.max_retries,
            delay: policy.base_delay,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Consume one retry, returning the delay to wait before it
    fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self.delay;
        self.delay = self.delay.saturating_mul(2);
        Some(delay)
    }
}

/// Retrying wrapper around single store calls
#[derive(Debug, Clone, Default)]
pub struct ResilientTransport {
    policy: RetryPolicy,
}

impl ResilientTransport {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out
    ///
    /// `label` names the call in log output. Backoff sleeps suspend only the
    /// calling task.
    pub async fn perform<T, F, Fut>(&self, label: &str, mut attempt: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut state = RetryState::new(&self.policy);

        loop {
            state.begin_attempt();

            let err = match attempt().await {
                Ok(value) => {
                    if state.attempts() > 1 {
                        debug!(label, attempts = state.attempts(), "Call succeeded after retrying");
                    }
                    return Ok(value);
                },
                Err(err) => err,
            };

            if !err.is_transient() {
                debug!(label, error = %err, "Call failed permanently");
                return Err(err);
            }

            match state.next_delay() {
                Some(delay) => {
                    warn!(
                        label,
                        attempt = state.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
                None => {
                    error!(
                        label,
                        attempts = state.attempts(),
                        error = %err,
                        "Retries exhausted"
                    );
                    return Err(err);
                },
            }
        }
    }
}
