//! Transport settings for [`SfHttpClient`](crate::SfHttpClient).

use crate::retry::RetryConfig;
use std::time::Duration;

/// How SOAP requests are sent.
///
/// Every request goes out exactly once unless a [`RetryConfig`] is set.
/// Metadata writes are not idempotent, so resending them is the caller's
/// call.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request deadline. Deploy submissions carry the base64 archive
    /// in the envelope, so this is generous by default.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Ask for gzip/deflate responses. Retrieve results are large and
    /// compress well.
    pub accept_compressed: bool,
    pub retry: Option<RetryConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            accept_compressed: true,
            retry: None,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Resend failed requests according to `retry`.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
