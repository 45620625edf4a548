use tracing::instrument;

use super::envelope::text_element;
use super::parse;
use crate::error::{Error, ErrorKind, Result};
use crate::list::ListMetadataQuery;
use crate::types::{FileProperties, MAX_LIST_QUERIES};

impl super::MetadataClient {
    /// List the components matching up to three queries.
    ///
    /// Results are as of this client's API version.
    #[instrument(skip(self, queries), fields(count = queries.len()))]
    pub async fn list_metadata(&self, queries: &[ListMetadataQuery]) -> Result<Vec<FileProperties>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        if queries.len() > MAX_LIST_QUERIES {
            return Err(Error::new(ErrorKind::InvalidRequest(format!(
                "at most {} list queries per call, got {}",
                MAX_LIST_QUERIES,
                queries.len()
            ))));
        }

        let mut body: Vec<String> = queries
            .iter()
            .map(|q| format!("      {}", q.to_xml()))
            .collect();
        body.push(text_element("asOfVersion", &self.api_version));

        let response = self.call("listMetadata", &body.join("\n")).await?;
        Ok(parse::list_results(&response))
    }

    /// List every component of one type.
    pub async fn list_metadata_type(&self, metadata_type: &str) -> Result<Vec<FileProperties>> {
        self.list_metadata(&[ListMetadataQuery::new(metadata_type)])
            .await
    }
}
