//! # forcemeta-auth
//!
//! Connection handles for the Salesforce Metadata API.
//!
//! Takes a session that already exists (explicit values, environment
//! variables or the `sf` CLI) and exposes it through the [`Credentials`]
//! trait. Logging in and refreshing tokens happen elsewhere.
//!
//! ## Security
//!
//! Access tokens are redacted in `Debug` output and never appear in errors.
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcemeta_auth::{Credentials, SalesforceCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), forcemeta_auth::Error> {
//!     // From SF_INSTANCE_URL / SF_ACCESS_TOKEN
//!     let creds = SalesforceCredentials::from_env()?;
//!
//!     // From an org the sf CLI is already logged into
//!     let creds = SalesforceCredentials::from_sfdx_alias("my-scratch").await?;
//!     println!("{}", creds.metadata_url());
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;

pub use credentials::{Credentials, SalesforceCredentials};
pub use error::{Error, ErrorKind, Result};
