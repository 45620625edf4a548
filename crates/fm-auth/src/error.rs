//! Error types for forcemeta-auth.
//!
//! Error messages never carry credential values.

/// Result type alias for forcemeta-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for forcemeta-auth operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Invalid credentials configuration.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// sf CLI error.
    #[error("SFDX CLI error: {0}")]
    SfdxCli(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(
            ErrorKind::InvalidCredentials(format!("instance URL: {}", err)),
            err,
        )
    }
}
