//! # forcemeta
//!
//! A Salesforce Metadata API client library for Rust.
//!
//! Typed calls become SOAP requests, and SOAP responses and faults become
//! typed results or errors. Deployments and retrieves return job handles that
//! can be checked, waited on, or streamed.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Every value placed in a request is XML-escaped
//!
//! ## Crates
//!
//! - **forcemeta-client** - HTTP/SOAP transport with opt-in retry, compression and error classification
//! - **forcemeta-auth** - Session handles from explicit values, environment or the sf CLI
//! - **forcemeta-metadata** - Metadata API: CRUD, deploy, retrieve, list and describe
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forcemeta::{MetadataClient, SalesforceCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = SalesforceCredentials::from_sfdx_alias("my-org").await?;
//!     let client = MetadataClient::new(&creds)?;
//!
//!     let objects = client
//!         .read_metadata("CustomObject", &["Account", "Missing__c"])
//!         .await?;
//!     for object in objects.iter().flatten() {
//!         println!("{:?}", object.full_name());
//!     }
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use forcemeta_auth as auth;
#[cfg(feature = "client")]
pub use forcemeta_client as client;
#[cfg(feature = "metadata")]
pub use forcemeta_metadata as metadata;

#[cfg(feature = "auth")]
pub use forcemeta_auth::{Credentials, SalesforceCredentials};
#[cfg(feature = "client")]
pub use forcemeta_client::{ClientConfig, RetryConfig};
#[cfg(feature = "metadata")]
pub use forcemeta_metadata::{
    DeployJob, DeployOptions, MetadataClient, MetadataRecord, PollOptions, RetrieveJob,
    RetrieveOptions,
};
