//! Transport errors.
//!
//! Anything here means the service did not answer with a SOAP envelope the
//! caller can read. Faults are not errors at this layer.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// A failed SOAP round trip.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// The session was rejected before the SOAP layer saw the request.
    /// A fresh access token is needed.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    /// The wait the service asked for on a 429, if it sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status of a non-fault error response.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http { status, .. } => Some(*status),
            ErrorKind::Authentication(_) => Some(401),
            ErrorKind::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// An error status whose body is not a SOAP fault, typically from a
    /// proxy or load balancer. `body` is truncated.
    #[error("HTTP {status} without a SOAP fault: {body}")]
    Http { status: u16, body: String },

    #[error("Request throttled (HTTP 429){}", retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 401.
    #[error("Session rejected: {0}")]
    Authentication(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    /// The HTTP client could not be built from the configuration.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// `last` is the message of the final failure.
    #[error("Gave up after {attempts} retries: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };
        Error::with_source(kind, err)
    }
}
