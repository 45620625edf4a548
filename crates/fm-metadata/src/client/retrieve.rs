use tracing::{debug, info, instrument};

use super::envelope::text_element;
use super::parse;
use crate::error::Result;
use crate::job::RetrieveJob;
use crate::retrieve::{RetrieveOptions, RetrieveResult};

impl super::MetadataClient {
    /// Start a retrieve.
    ///
    /// Returns a handle; use [`RetrieveJob::stream`] for the archive bytes
    /// or [`RetrieveJob::complete`] for the full result. A request naming
    /// nothing to retrieve is rejected before anything is sent.
    #[instrument(skip(self, options), fields(packages = options.package_names.len()))]
    pub async fn retrieve(&self, options: RetrieveOptions) -> Result<RetrieveJob> {
        options.validate()?;

        let body = format!(
            "      <met:retrieveRequest>\n        {}\n      </met:retrieveRequest>",
            options.to_xml(&self.api_version)
        );
        let response = self.call("retrieve", &body).await?;
        let id = parse::async_id(&response)?;
        info!(retrieve_id = %id, "Retrieve submitted");
        Ok(RetrieveJob::new(self.clone(), id))
    }

    /// Check the status of a retrieve operation.
    ///
    /// With `include_zip`, a finished retrieve carries its decoded archive.
    pub async fn check_retrieve_status(
        &self,
        async_process_id: &str,
        include_zip: bool,
    ) -> Result<RetrieveResult> {
        let body = format!(
            "{}\n      <met:includeZip>{}</met:includeZip>",
            text_element("asyncProcessId", async_process_id),
            include_zip
        );
        let response = self.call("checkRetrieveStatus", &body).await?;
        let result = parse::retrieve_result(&response)?;
        debug!(
            retrieve_id = %result.id,
            status = %result.status,
            archive_bytes = result.zip_file.as_ref().map(|z| z.len()),
            "Retrieve status"
        );
        Ok(result)
    }
}
