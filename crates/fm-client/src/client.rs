//! SOAP-over-HTTP client with retry and fault pass-through.

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::retry::RetryState;

/// SOAP Action header name.
const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Content type for SOAP 1.1 requests.
const SOAP_CONTENT_TYPE: &str = "text/xml;charset=UTF-8";

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the Metadata API SOAP endpoint.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Create a new HTTP client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POST a SOAP envelope and return the response body.
    ///
    /// A response carrying a SOAP fault is returned as `Ok` regardless of its
    /// HTTP status; interpreting the fault is the caller's job. Transport
    /// failures and non-fault error statuses become [`Error`]s, and only
    /// those are ever retried.
    #[instrument(skip(self, access_token, envelope), fields(soap_action = %soap_action))]
    pub async fn post_soap(
        &self,
        url: &str,
        soap_action: &str,
        access_token: &str,
        envelope: impl Into<Bytes>,
    ) -> Result<String> {
        let envelope = envelope.into();
        let mut retry = self.config.retry.as_ref().map(RetryState::new);

        loop {
            let err = match self
                .post_once(url, soap_action, access_token, envelope.clone())
                .await
            {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            let Some(state) = retry.as_mut().filter(|s| s.should_retry(&err)) else {
                return Err(err);
            };
            let Some(delay) = state.next_delay(err.retry_after()) else {
                return Err(Error::with_source(
                    ErrorKind::RetriesExhausted {
                        attempts: state.retries(),
                        last: err.to_string(),
                    },
                    err,
                ));
            };

            warn!(
                retry = state.retries(),
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "SOAP request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn post_once(
        &self,
        url: &str,
        soap_action: &str,
        access_token: &str,
        envelope: Bytes,
    ) -> Result<String> {
        debug!(url, bytes = envelope.len(), "Sending SOAP request");

        let response = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header(SOAP_ACTION_HEADER, soap_action)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers().get(RETRY_AFTER));
        let body = response.text().await?;

        if status.is_success() {
            debug!(status = status.as_u16(), bytes = body.len(), "SOAP response received");
        } else {
            info!(status = status.as_u16(), bytes = body.len(), "Non-success SOAP response");
        }

        if status.is_success() || looks_like_soap_fault(&body) {
            return Ok(body);
        }

        let kind = match status.as_u16() {
            401 => ErrorKind::Authentication(truncate(&body)),
            429 => ErrorKind::RateLimited { retry_after },
            code => ErrorKind::Http {
                status: code,
                body: truncate(&body),
            },
        };
        Err(Error::new(kind))
    }
}

/// Salesforce reports faults with HTTP 500; the body is the useful part.
fn looks_like_soap_fault(body: &str) -> bool {
    body.contains(":Fault>") || body.contains("<Fault>")
}

fn parse_retry_after(value: Option<&reqwest::header::HeaderValue>) -> Option<Duration> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
