use tracing::instrument;

use super::envelope::text_element;
use super::parse;
use crate::describe::{DescribeMetadataResult, MetadataType};
use crate::error::Result;

impl super::MetadataClient {
    /// Describe the metadata types available in the org.
    #[instrument(skip(self))]
    pub async fn describe_metadata(&self) -> Result<DescribeMetadataResult> {
        let body = text_element("asOfVersion", &self.api_version);
        let response = self.call("describeMetadata", &body).await?;
        parse::describe_result(&response)
    }

    /// Just the metadata types from [`describe_metadata`](Self::describe_metadata).
    pub async fn list_metadata_types(&self) -> Result<Vec<MetadataType>> {
        Ok(self.describe_metadata().await?.metadata_objects)
    }
}
