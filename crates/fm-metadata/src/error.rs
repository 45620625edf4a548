//! Error types for forcemeta-metadata.

use crate::types::{ComponentFailure, SoapFault};

pub type Result<T> = std::result::Result<T, Error>;

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

    /// The fault returned by the service, if the whole call was rejected.
    pub fn soap_fault(&self) -> Option<&SoapFault> {
        match &self.kind {
            ErrorKind::SoapFault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns true if an async job did not finish within its poll timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),
    #[error("Auth error: {0}")]
    Auth(String),
    /// The service rejected the whole call.
    #[error("{0}")]
    SoapFault(SoapFault),
    /// Rejected locally before anything was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Deployment failed: {message}")]
    DeploymentFailed {
        message: String,
        failures: Vec<ComponentFailure>,
    },
    #[error("Retrieve failed: {0}")]
    RetrieveFailed(String),
    #[error("XML parse error: {0}")]
    Parse(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Timed out waiting for async operation")]
    Timeout,
    #[error("IO error: {0}")]
    Io(String),
}

impl From<forcemeta_client::Error> for Error {
    fn from(err: forcemeta_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.to_string()), err)
    }
}

impl From<forcemeta_auth::Error> for Error {
    fn from(err: forcemeta_auth::Error) -> Self {
        Error::with_source(ErrorKind::Auth(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::with_source(ErrorKind::Parse(format!("archive is not valid base64: {}", err)), err)
    }
}
