use base64::{engine::general_purpose, Engine as _};
use forcemeta_client::security::xml;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, instrument};

use super::envelope::text_element;
use super::parse;
use crate::deploy::{CancelDeployResult, DeployOptions, DeployResult};
use crate::error::{Error, ErrorKind, Result};
use crate::job::DeployJob;

impl super::MetadataClient {
    /// Deploy a metadata package.
    ///
    /// The `package_zip` must be a zip file with metadata in the standard
    /// directory layout (e.g. `classes/MyClass.cls` plus `package.xml`).
    /// Returns a handle to the running deployment.
    #[instrument(skip(self, package_zip, options), fields(bytes = package_zip.len()))]
    pub async fn deploy(&self, package_zip: &[u8], options: DeployOptions) -> Result<DeployJob> {
        let test_level = options.effective_test_level()?;
        let encoded_zip = general_purpose::STANDARD.encode(package_zip);

        let mut settings = vec![
            format!("<met:allowMissingFiles>{}</met:allowMissingFiles>", options.allow_missing_files),
            format!("<met:autoUpdatePackage>{}</met:autoUpdatePackage>", options.auto_update_package),
            format!("<met:checkOnly>{}</met:checkOnly>", options.check_only),
            format!("<met:ignoreWarnings>{}</met:ignoreWarnings>", options.ignore_warnings),
            format!("<met:performRetrieve>{}</met:performRetrieve>", options.perform_retrieve),
            format!("<met:purgeOnDelete>{}</met:purgeOnDelete>", options.purge_on_delete),
            format!("<met:rollbackOnError>{}</met:rollbackOnError>", options.rollback_on_error),
            format!("<met:runAllTests>{}</met:runAllTests>", options.run_all_tests),
        ];
        settings.extend(
            options
                .run_tests
                .iter()
                .map(|t| format!("<met:runTests>{}</met:runTests>", xml::escape(t))),
        );
        settings.push(format!("<met:singlePackage>{}</met:singlePackage>", options.single_package));
        if let Some(level) = test_level {
            settings.push(format!("<met:testLevel>{}</met:testLevel>", level));
        }

        let body = format!(
            "      <met:ZipFile>{}</met:ZipFile>\n      <met:DeployOptions>\n        {}\n      </met:DeployOptions>",
            encoded_zip,
            settings.join("\n        ")
        );

        let response = self.call("deploy", &body).await?;
        let id = parse::async_id(&response)?;
        info!(deploy_id = %id, check_only = options.check_only, "Deployment submitted");
        Ok(DeployJob::new(self.clone(), id))
    }

    /// Deploy a package read from `reader`, e.g. an open zip file.
    pub async fn deploy_from_reader<R>(&self, mut reader: R, options: DeployOptions) -> Result<DeployJob>
    where
        R: AsyncRead + Unpin,
    {
        let mut package_zip = Vec::new();
        reader.read_to_end(&mut package_zip).await?;
        self.deploy(&package_zip, options).await
    }

    /// Deploy and wait for the deployment to finish.
    ///
    /// Unlike [`DeployJob::complete`], a deployment that ends without
    /// success is returned as `ErrorKind::DeploymentFailed`.
    pub async fn deploy_and_wait(
        &self,
        package_zip: &[u8],
        options: DeployOptions,
    ) -> Result<DeployResult> {
        self.deploy(package_zip, options)
            .await?
            .complete()
            .await?
            .into_success()
    }

    /// Check the status of a deploy operation.
    pub async fn check_deploy_status(
        &self,
        async_process_id: &str,
        include_details: bool,
    ) -> Result<DeployResult> {
        let body = format!(
            "{}\n      <met:includeDetails>{}</met:includeDetails>",
            text_element("asyncProcessId", async_process_id),
            include_details
        );
        let response = self.call("checkDeployStatus", &body).await?;
        let result = parse::deploy_result(&response)?;
        debug!(
            deploy_id = %result.id,
            status = %result.status,
            deployed = result.number_components_deployed,
            total = result.number_components_total,
            "Deploy status"
        );
        Ok(result)
    }

    /// Request cancellation of an in-progress deployment.
    ///
    /// Cancellation is asynchronous: poll the deployment until it reaches
    /// `Canceled`.
    #[instrument(skip(self))]
    pub async fn cancel_deploy(&self, async_process_id: &str) -> Result<CancelDeployResult> {
        let body = text_element("String", async_process_id);
        let response = self.call("cancelDeploy", &body).await?;
        parse::cancel_deploy_result(&response)
    }

    /// Quick-deploy a validation (a `check_only` deploy with passing tests)
    /// without running the tests again.
    #[instrument(skip(self))]
    pub async fn deploy_recent_validation(&self, validation_id: &str) -> Result<DeployJob> {
        let body = text_element("validationId", validation_id);
        let response = self.call("deployRecentValidation", &body).await?;
        // The response carries the new deploy ID as a bare string.
        let id = response
            .child_string("result")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse(
                    "no deploy ID in deployRecentValidation response".to_string(),
                ))
            })?;
        Ok(DeployJob::new(self.clone(), id))
    }
}
