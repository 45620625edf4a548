//! Credentials trait and implementations.
//!
//! All credential types implement custom Debug to redact sensitive data.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};

/// Trait for an authenticated Salesforce session.
pub trait Credentials: Send + Sync {
    /// Get the Salesforce instance URL.
    fn instance_url(&self) -> &str;

    /// Get the access (session) token.
    fn access_token(&self) -> &str;

    /// Get the API version (e.g., "62.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }

    /// Metadata API SOAP endpoint for this session.
    fn metadata_url(&self) -> String {
        format!(
            "{}/services/Soap/m/{}",
            self.instance_url().trim_end_matches('/'),
            self.api_version()
        )
    }
}

/// Standard Salesforce credentials implementation.
///
/// The access token is redacted in Debug output to prevent accidental
/// exposure in logs.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// `result` object of `sf org display --json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrgDisplay {
    instance_url: Option<String>,
    access_token: Option<String>,
    api_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrgDisplayEnvelope {
    result: Option<OrgDisplay>,
}

impl SalesforceCredentials {
    /// Create new credentials with the given values.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
        }
    }

    /// Check that the instance URL is an absolute http(s) URL and the token is present.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.instance_url)?;
        if !matches!(url.scheme(), "https" | "http") {
            return Err(Error::new(ErrorKind::InvalidCredentials(format!(
                "unsupported instance URL scheme '{}'",
                url.scheme()
            ))));
        }
        if self.access_token.is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "access token is empty".to_string(),
            )));
        }
        Ok(())
    }

    /// Replace the access token (e.g., after the caller refreshed the session).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_INSTANCE_URL` or `SALESFORCE_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN` or `SALESFORCE_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_API_VERSION` or `SALESFORCE_API_VERSION` (default: "62.0")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let first = |names: [&str; 2]| names.iter().find_map(|n| lookup(n).filter(|v| !v.is_empty()));

        let instance_url = first(["SF_INSTANCE_URL", "SALESFORCE_INSTANCE_URL"])
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())))?;
        let access_token = first(["SF_ACCESS_TOKEN", "SALESFORCE_ACCESS_TOKEN"])
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())))?;
        let api_version = first(["SF_API_VERSION", "SALESFORCE_API_VERSION"])
            .unwrap_or_else(|| forcemeta_client::DEFAULT_API_VERSION.to_string());

        let creds = Self::new(instance_url, access_token, api_version);
        creds.validate()?;
        Ok(creds)
    }

    /// Load credentials from the sf CLI using an org alias or username.
    ///
    /// Requires the `sf` CLI to be installed and the org to be authenticated.
    #[instrument]
    pub async fn from_sfdx_alias(alias_or_username: &str) -> Result<Self> {
        use tokio::process::Command;

        let output = Command::new("sf")
            .args(["org", "display", "--target-org", alias_or_username, "--json"])
            .output()
            .await
            .map_err(|e| Error::with_source(ErrorKind::SfdxCli(format!("Failed to run sf CLI: {}", e)), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::new(ErrorKind::SfdxCli(format!(
                "sf org display failed: {}",
                stderr.trim()
            ))));
        }

        let creds = Self::from_org_display(&output.stdout)?;
        debug!(instance_url = %creds.instance_url, "Loaded credentials from sf CLI");
        Ok(creds)
    }

    fn from_org_display(stdout: &[u8]) -> Result<Self> {
        let envelope: OrgDisplayEnvelope = serde_json::from_slice(stdout)?;
        let org = envelope.result.ok_or_else(|| {
            Error::new(ErrorKind::SfdxCli("Missing 'result' in output".to_string()))
        })?;

        let instance_url = org
            .instance_url
            .ok_or_else(|| Error::new(ErrorKind::SfdxCli("Missing instanceUrl".to_string())))?;
        let access_token = org
            .access_token
            .ok_or_else(|| Error::new(ErrorKind::SfdxCli("Missing accessToken".to_string())))?;
        let api_version = org
            .api_version
            .unwrap_or_else(|| forcemeta_client::DEFAULT_API_VERSION.to_string());

        Ok(Self::new(instance_url, access_token, api_version))
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}
