//! Metadata API client.

use forcemeta_auth::Credentials;
use forcemeta_client::{ClientConfig, SfHttpClient};
use tracing::debug;

use crate::error::Result;
use crate::job::PollOptions;
use crate::types::DEFAULT_API_VERSION;
use crate::xml::XmlElement;

mod crud;
mod deploy;
mod describe;
mod envelope;
mod list;
mod parse;
mod retrieve;

/// Salesforce Metadata API client.
///
/// Cloning is cheap and clones share the HTTP connection pool. Nothing is
/// cached between calls.
#[derive(Clone)]
pub struct MetadataClient {
    instance_url: String,
    access_token: String,
    api_version: String,
    http: SfHttpClient,
    poll: PollOptions,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("poll", &self.poll)
            .finish()
    }
}

impl MetadataClient {
    /// Create a client for an existing session.
    pub fn new(credentials: &impl Credentials) -> Result<Self> {
        Ok(
            Self::from_parts(credentials.instance_url(), credentials.access_token())?
                .with_api_version(credentials.api_version()),
        )
    }

    /// Create a client from an instance URL and access token.
    pub fn from_parts(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let instance_url: String = instance_url.into();
        Ok(Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http: SfHttpClient::default_client()?,
            poll: PollOptions::default(),
        })
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Rebuild the HTTP client from `config` (timeouts, retry policy, ...).
    pub fn with_config(mut self, config: ClientConfig) -> Result<Self> {
        self.http = SfHttpClient::new(config)?;
        Ok(self)
    }

    /// Use an existing HTTP client, sharing its connection pool.
    pub fn with_http_client(mut self, http: SfHttpClient) -> Self {
        self.http = http;
        self
    }

    /// Default polling for job handles created by this client.
    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Get the Metadata API SOAP endpoint URL.
    pub fn metadata_url(&self) -> String {
        format!("{}/services/Soap/m/{}", self.instance_url, self.api_version)
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn poll_options(&self) -> PollOptions {
        self.poll
    }

    /// Send one operation and return the `{operation}Response` element.
    pub(crate) async fn call(&self, operation: &str, body: &str) -> Result<XmlElement> {
        let request = envelope::build(&self.access_token, operation, body);
        debug!(operation, bytes = request.len(), "Calling Metadata API");

        let response = self
            .http
            .post_soap(&self.metadata_url(), operation, &self.access_token, request)
            .await?;

        parse::response_body(&response, operation)
    }
}
