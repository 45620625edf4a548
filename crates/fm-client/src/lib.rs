//! # forcemeta-client
//!
//! Transport layer for the Salesforce Metadata API.
//!
//! This crate owns everything below the SOAP envelope:
//! - HTTP client construction (timeouts, compression, user agent)
//! - SOAP fault pass-through so callers can surface the fault itself
//! - Opt-in retry of requests that got no SOAP answer at all
//! - XML escaping for values interpolated into envelopes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    forcemeta-metadata                       │
//! │  (CRUD, deploy, retrieve, list, describe)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  envelope + SOAPAction
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - POST with retry policy (off unless configured)           │
//! │  - Faults returned as bodies, transport errors as Error     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcemeta_client::{ClientConfig, RetryConfig, SfHttpClient};
//!
//! let http = SfHttpClient::new(
//!     ClientConfig::builder()
//!         .with_retry(RetryConfig::default())
//!         .build(),
//! )?;
//!
//! let body = http
//!     .post_soap(
//!         "https://na1.salesforce.com/services/Soap/m/62.0",
//!         "describeMetadata",
//!         access_token,
//!         envelope,
//!     )
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod retry;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use retry::{BackoffStrategy, RetryConfig};

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("forcemeta/", env!("CARGO_PKG_VERSION"));
