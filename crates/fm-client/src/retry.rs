//! Opt-in retry for SOAP calls.
//!
//! A SOAP fault is an answer from the service: `post_soap` hands it back as a
//! body and it never reaches this module. What can be retried is the case
//! where no answer arrived at all, which the transport reports as an
//! [`Error`]: throttling, a 5xx from a gateway or load balancer with no fault
//! in the body, a timeout or a dropped connection.

use rand::Rng;
use std::time::Duration;

use crate::error::{Error, ErrorKind};

/// When and how often a failed request is sent again.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first request. Zero disables retrying.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay, including one taken from
    /// `Retry-After`.
    pub max_delay: Duration,
    pub backoff: BackoffStrategy,
    /// Resend requests that got a 500/502/503/504 without a SOAP fault.
    ///
    /// The request may have reached the org before the gateway gave up, so
    /// a resent `createMetadata` can report `DUPLICATE_DEVELOPER_NAME`.
    pub retry_server_errors: bool,
    /// Cap on a server-sent `Retry-After`. `None` ignores the header and
    /// uses the backoff delay instead.
    pub max_retry_after: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: BackoffStrategy::Exponential {
                factor: 2.0,
                jitter: true,
            },
            retry_server_errors: true,
            max_retry_after: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Only retry throttling, timeouts and connection failures.
    pub fn without_server_errors(mut self) -> Self {
        self.retry_server_errors = false;
        self
    }

    pub fn with_max_retry_after(mut self, cap: Option<Duration>) -> Self {
        self.max_retry_after = cap;
        self
    }

    /// Whether a transport error is worth sending the request again for.
    ///
    /// Authentication failures, client errors and anything the service
    /// answered with a fault are final.
    pub fn should_retry(&self, err: &Error) -> bool {
        match &err.kind {
            ErrorKind::RateLimited { .. } | ErrorKind::Timeout | ErrorKind::Connection(_) => true,
            ErrorKind::Http { status, .. } => {
                self.retry_server_errors && matches!(status, 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    fn delay_for(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        match (retry_after, self.max_retry_after) {
            (Some(requested), Some(cap)) => requested.min(cap).min(self.max_delay),
            _ => self
                .backoff
                .delay(retry, self.initial_delay, self.max_delay),
        }
    }
}

/// How the delay grows from one retry to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// `initial_delay` every time.
    Constant,
    /// `initial_delay * (retry + 1)`.
    Linear,
    /// `initial_delay * factor^retry`. With `jitter`, each delay is stretched
    /// by a random amount of up to 100% so clients that failed together do
    /// not retry together.
    Exponential { factor: f64, jitter: bool },
}

impl BackoffStrategy {
    /// Delay before retry number `retry` (0-based), never above `max_delay`.
    pub fn delay(&self, retry: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
        let initial = initial_delay.as_secs_f64();
        let secs = match *self {
            BackoffStrategy::Constant => initial,
            BackoffStrategy::Linear => initial * (f64::from(retry) + 1.0),
            BackoffStrategy::Exponential { factor, jitter } => {
                let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
                let secs = initial * factor.powi(exponent);
                if jitter {
                    secs * (1.0 + rand::rng().random::<f64>())
                } else {
                    secs
                }
            }
        };
        capped(secs, max_delay)
    }
}

/// `secs` as a duration no longer than `max`; infinite or out-of-range
/// values become `max`.
fn capped(secs: f64, max: Duration) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).map_or(max, |delay| delay.min(max))
}

/// Retry bookkeeping for one `post_soap` call.
#[derive(Debug)]
pub(crate) struct RetryState<'a> {
    config: &'a RetryConfig,
    retries: u32,
}

impl<'a> RetryState<'a> {
    pub(crate) fn new(config: &'a RetryConfig) -> Self {
        Self { config, retries: 0 }
    }

    pub(crate) fn retries(&self) -> u32 {
        self.retries
    }

    pub(crate) fn should_retry(&self, err: &Error) -> bool {
        self.config.should_retry(err)
    }

    /// Count a retry and return how long to wait before it, or `None` when
    /// the budget is spent.
    pub(crate) fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.retries >= self.config.max_attempts {
            return None;
        }
        let delay = self.config.delay_for(self.retries, retry_after);
        self.retries += 1;
        Some(delay)
    }
}
