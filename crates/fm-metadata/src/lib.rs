//! # forcemeta-metadata
//!
//! Salesforce Metadata API client.
//!
//! ## Features
//!
//! - **CRUD** - Create, read, update, upsert, rename and delete components
//! - **Deploy** - Submit zip packages and follow them with a [`DeployJob`]
//! - **Retrieve** - Fetch packages or manifests as an archive byte stream
//! - **List / Describe** - Discover components and metadata types
//!
//! Records are ordered field maps ([`MetadataRecord`]) that convert to and
//! from typed shapes such as [`CustomObject`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcemeta_auth::SalesforceCredentials;
//! use forcemeta_metadata::{CustomObject, DeployOptions, MetadataClient, MetadataRecord, RetrieveOptions};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), forcemeta_metadata::Error> {
//!     let creds = SalesforceCredentials::from_env()?;
//!     let client = MetadataClient::new(&creds)?;
//!
//!     let record = MetadataRecord::from_typed(&CustomObject::new("Widget__c", "Widget"))?;
//!     let results = client.create_metadata("CustomObject", &[record]).await?;
//!     assert!(results[0].success);
//!
//!     let zip = std::fs::read("package.zip")?;
//!     let result = client
//!         .deploy(&zip, DeployOptions::default().run_tests(["MyApexTriggerTest"]))
//!         .await?
//!         .complete()
//!         .await?;
//!     println!("Deploy status: {}", result.status);
//!
//!     let mut archive = client
//!         .retrieve(RetrieveOptions::packages(["My Test Package"]))
//!         .await?
//!         .stream();
//!     while let Some(chunk) = archive.next().await {
//!         println!("{} bytes", chunk?.len());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod deploy;
mod describe;
mod error;
mod job;
mod list;
mod record;
mod retrieve;
mod types;
mod xml;

pub use client::MetadataClient;
pub use deploy::{CancelDeployResult, DeployOptions, DeployResult, DeployStatus};
pub use describe::{DescribeMetadataResult, MetadataType};
pub use error::{Error, ErrorKind, Result};
pub use job::{ArchiveStream, DeployJob, PollOptions, RetrieveJob, DEFAULT_CHUNK_SIZE};
pub use list::ListMetadataQuery;
pub use record::{CustomObject, DeploymentStatus, MetadataRecord, NameField, SharingModel};
pub use retrieve::{
    PackageManifest, PackageTypeMembers, RetrieveMessage, RetrieveOptions, RetrieveResult,
    RetrieveStatus,
};
pub use types::{
    ComponentFailure, ComponentSuccess, DeleteResult, FileProperties, MetadataError, SaveResult,
    SoapFault, TestFailure, TestLevel, UpsertResult, DEFAULT_API_VERSION, MAX_CRUD_COMPONENTS,
    MAX_LIST_QUERIES,
};
