//! Synchronous CRUD calls: create, read, update, upsert, rename, delete.
//!
//! These cover metadata types that can be edited in place (custom objects,
//! fields, layouts, ...). ApexClass and ApexTrigger go through deploy.

use forcemeta_client::security::xml;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::envelope::{metadata_element, text_element};
use super::parse;
use crate::error::{Error, ErrorKind, Result};
use crate::record::MetadataRecord;
use crate::types::{DeleteResult, SaveResult, UpsertResult, MAX_CRUD_COMPONENTS};

impl super::MetadataClient {
    /// Create one or more metadata components.
    ///
    /// Returns one result per record, in input order. A record the service
    /// refuses comes back with `success == false`; only a rejected call as a
    /// whole is an error.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn create_metadata(
        &self,
        metadata_type: &str,
        records: &[MetadataRecord],
    ) -> Result<Vec<SaveResult>> {
        if !check_batch(records.len())? {
            return Ok(Vec::new());
        }
        let body = records_body(metadata_type, records)?;
        let response = self.call("createMetadata", &body).await?;
        let results = parse::save_results(&response);
        expect_len("createMetadata", results.len(), records.len())?;
        log_save_failures("createMetadata", &results);
        Ok(results)
    }

    /// Read components by full name.
    ///
    /// The output has one slot per requested name, in request order. A name
    /// the service did not return (it does not exist) yields `None`.
    /// Records are matched to names by `fullName`, ignoring case.
    #[instrument(skip(self, full_names), fields(count = full_names.len()))]
    pub async fn read_metadata(
        &self,
        metadata_type: &str,
        full_names: &[&str],
    ) -> Result<Vec<Option<MetadataRecord>>> {
        if !check_batch(full_names.len())? {
            return Ok(Vec::new());
        }

        let mut body = vec![text_element("type", metadata_type)];
        body.extend(full_names.iter().map(|n| text_element("fullNames", n)));

        let response = self.call("readMetadata", &body.join("\n")).await?;
        let returned = parse::read_records(&response);
        let found = returned.iter().filter(|r| r.is_some()).count();
        debug!(requested = full_names.len(), found, "readMetadata returned");

        Ok(align_by_full_name(full_names, returned))
    }

    /// Read a single component. `None` if it does not exist.
    pub async fn read_metadata_one(
        &self,
        metadata_type: &str,
        full_name: &str,
    ) -> Result<Option<MetadataRecord>> {
        let mut records = self.read_metadata(metadata_type, &[full_name]).await?;
        Ok(records.pop().flatten())
    }

    /// Read components and convert each into a typed shape such as
    /// [`CustomObject`](crate::CustomObject).
    pub async fn read_metadata_as<T: DeserializeOwned>(
        &self,
        metadata_type: &str,
        full_names: &[&str],
    ) -> Result<Vec<Option<T>>> {
        self.read_metadata(metadata_type, full_names)
            .await?
            .into_iter()
            .map(|record| record.map(MetadataRecord::into_typed).transpose())
            .collect()
    }

    /// Update existing components. Every field of the record is replaced.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn update_metadata(
        &self,
        metadata_type: &str,
        records: &[MetadataRecord],
    ) -> Result<Vec<SaveResult>> {
        if !check_batch(records.len())? {
            return Ok(Vec::new());
        }
        let body = records_body(metadata_type, records)?;
        let response = self.call("updateMetadata", &body).await?;
        let results = parse::save_results(&response);
        expect_len("updateMetadata", results.len(), records.len())?;
        log_save_failures("updateMetadata", &results);
        Ok(results)
    }

    /// Create components that do not exist and update those that do.
    ///
    /// `created` on each result tells which happened.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn upsert_metadata(
        &self,
        metadata_type: &str,
        records: &[MetadataRecord],
    ) -> Result<Vec<UpsertResult>> {
        if !check_batch(records.len())? {
            return Ok(Vec::new());
        }
        let body = records_body(metadata_type, records)?;
        let response = self.call("upsertMetadata", &body).await?;
        let results = parse::upsert_results(&response);
        expect_len("upsertMetadata", results.len(), records.len())?;

        for result in results.iter().filter(|r| !r.success) {
            warn!(
                operation = "upsertMetadata",
                full_name = %result.full_name,
                status_code = result.first_error().map(|e| e.status_code.as_str()),
                "Component was not saved"
            );
        }
        Ok(results)
    }

    /// Rename a component.
    ///
    /// The result's `full_name` is the name the service reports, which is
    /// the old name.
    #[instrument(skip(self))]
    pub async fn rename_metadata(
        &self,
        metadata_type: &str,
        old_full_name: &str,
        new_full_name: &str,
    ) -> Result<SaveResult> {
        let body = [
            text_element("type", metadata_type),
            text_element("oldFullName", old_full_name),
            text_element("newFullName", new_full_name),
        ]
        .join("\n");

        let response = self.call("renameMetadata", &body).await?;
        let result = response
            .child("result")
            .map(parse::save_result)
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse(
                    "renameMetadataResponse has no result".to_string(),
                ))
            })?;
        log_save_failures("renameMetadata", std::slice::from_ref(&result));
        Ok(result)
    }

    /// Delete components by full name.
    ///
    /// Names that do not exist come back as failed results from the service.
    #[instrument(skip(self, full_names), fields(count = full_names.len()))]
    pub async fn delete_metadata(
        &self,
        metadata_type: &str,
        full_names: &[&str],
    ) -> Result<Vec<DeleteResult>> {
        if !check_batch(full_names.len())? {
            return Ok(Vec::new());
        }

        let mut body = vec![text_element("type", metadata_type)];
        body.extend(full_names.iter().map(|n| text_element("fullNames", n)));

        let response = self.call("deleteMetadata", &body.join("\n")).await?;
        let results = parse::save_results(&response);
        expect_len("deleteMetadata", results.len(), full_names.len())?;
        log_save_failures("deleteMetadata", &results);
        Ok(results)
    }
}

/// `Ok(false)` for an empty batch, which needs no call.
fn check_batch(len: usize) -> Result<bool> {
    if len > MAX_CRUD_COMPONENTS {
        return Err(Error::new(ErrorKind::InvalidRequest(format!(
            "at most {} components per call, got {}",
            MAX_CRUD_COMPONENTS, len
        ))));
    }
    Ok(len > 0)
}

fn records_body(metadata_type: &str, records: &[MetadataRecord]) -> Result<String> {
    if !xml::is_valid_element_name(metadata_type) {
        return Err(Error::new(ErrorKind::InvalidRequest(format!(
            "'{}' is not a valid metadata type name",
            metadata_type
        ))));
    }
    let elements = records
        .iter()
        .map(|record| metadata_element(metadata_type, record))
        .collect::<Result<Vec<_>>>()?;
    Ok(elements.join("\n"))
}

fn expect_len(operation: &str, got: usize, expected: usize) -> Result<()> {
    if got == expected {
        return Ok(());
    }
    Err(Error::new(ErrorKind::InvalidResponse(format!(
        "{} returned {} results for {} components",
        operation, got, expected
    ))))
}

fn log_save_failures(operation: &str, results: &[SaveResult]) {
    for result in results.iter().filter(|r| !r.success) {
        warn!(
            operation,
            full_name = %result.full_name,
            status_code = result.first_error().map(|e| e.status_code.as_str()),
            "Component was not saved"
        );
    }
}

/// Give each requested name the first unclaimed record with the same
/// `fullName`, or `None`.
fn align_by_full_name(
    full_names: &[&str],
    returned: Vec<Option<MetadataRecord>>,
) -> Vec<Option<MetadataRecord>> {
    let mut pool: Vec<Option<MetadataRecord>> = returned;
    full_names
        .iter()
        .map(|name| {
            let slot = pool.iter().position(|record| {
                record
                    .as_ref()
                    .and_then(MetadataRecord::full_name)
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })?;
            pool[slot].take()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MetadataClient;
    use crate::record::CustomObject;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn soap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="http://soap.sforce.com/2006/04/metadata" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"#,
            body
        )
    }

    fn client(server: &MockServer) -> MetadataClient {
        MetadataClient::from_parts(server.uri(), "test-token")
            .unwrap()
            .with_api_version("62.0")
    }

    fn object(name: &str) -> MetadataRecord {
        MetadataRecord::from_typed(&CustomObject::new(name, "Test Object")).unwrap()
    }

    fn named(name: &str) -> Option<MetadataRecord> {
        Some(MetadataRecord::new(name))
    }

    #[test]
    fn test_align_by_full_name_out_of_order_and_missing() {
        let aligned = align_by_full_name(
            &["B__c", "Missing__c", "a__c"],
            vec![named("A__c"), None, named("B__c")],
        );
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0].as_ref().unwrap().full_name(), Some("B__c"));
        assert!(aligned[1].is_none());
        assert_eq!(aligned[2].as_ref().unwrap().full_name(), Some("A__c"));
    }

    #[test]
    fn test_align_by_full_name_duplicates() {
        let aligned = align_by_full_name(&["A__c", "A__c"], vec![named("A__c")]);
        assert!(aligned[0].is_some());
        assert!(aligned[1].is_none());
    }

    #[test]
    fn test_check_batch() {
        assert!(!check_batch(0).unwrap());
        assert!(check_batch(10).unwrap());
        assert!(matches!(
            check_batch(11).unwrap_err().kind,
            ErrorKind::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn test_create_metadata_sends_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/Soap/m/62.0"))
            .and(header("SOAPAction", "createMetadata"))
            .and(body_string_contains("<met:sessionId>test-token</met:sessionId>"))
            .and(body_string_contains("xsi:type=\"met:CustomObject\""))
            .and(body_string_contains("<met:fullName>Sync1__c</met:fullName>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                "<createMetadataResponse>\
                   <result><fullName>Sync1__c</fullName><success>true</success></result>\
                   <result><fullName>Sync2__c</fullName><success>true</success></result>\
                 </createMetadataResponse>",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let results = client(&server)
            .create_metadata("CustomObject", &[object("Sync1__c"), object("Sync2__c")])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[1].full_name, "Sync2__c");
    }

    #[tokio::test]
    async fn test_create_metadata_result_count_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                "<createMetadataResponse><result><fullName>Sync1__c</fullName><success>true</success></result></createMetadataResponse>",
            )))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_metadata("CustomObject", &[object("Sync1__c"), object("Sync2__c")])
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_and_oversized_batches_make_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.create_metadata("CustomObject", &[]).await.unwrap().is_empty());
        assert!(client.delete_metadata("CustomObject", &[]).await.unwrap().is_empty());

        let many: Vec<MetadataRecord> = (0..11).map(|i| object(&format!("O{i}__c"))).collect();
        let err = client.update_metadata("CustomObject", &many).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_read_metadata_aligns_missing_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "readMetadata"))
            .and(body_string_contains("<met:fullNames>Missing__c</met:fullNames>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                r#"<readMetadataResponse><result>
                    <records xsi:type="CustomObject">
                      <fullName>Sync1__c</fullName>
                      <label>Test Object</label>
                      <nameField><label>Test Object Name</label><type>Text</type></nameField>
                      <sharingModel>ReadWrite</sharingModel>
                    </records>
                    <records xsi:type="CustomObject"/>
                  </result></readMetadataResponse>"#,
            )))
            .mount(&server)
            .await;

        let client = client(&server);
        let records = client
            .read_metadata("CustomObject", &["Sync1__c", "Missing__c"])
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        let first = records[0].as_ref().unwrap();
        assert_eq!(first.get("nameField").unwrap()["label"], json!("Test Object Name"));
        assert!(records[1].is_none());

        let typed: Vec<Option<CustomObject>> = client
            .read_metadata_as("CustomObject", &["Sync1__c", "Missing__c"])
            .await
            .unwrap();
        assert_eq!(typed[0].as_ref().unwrap().full_name, "Sync1__c");
        assert!(typed[1].is_none());
    }

    #[tokio::test]
    async fn test_read_then_update_keeps_text_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "readMetadata"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                "<readMetadataResponse><result>\n\
                   <records xsi:type=\"CustomObject\">\n\
                     <fullName>Sync1__c</fullName>\n\
                     <description>  two leading spaces\n</description>\n\
                     <label>a <![CDATA[<b>]]> c</label>\n\
                   </records>\n\
                 </result></readMetadataResponse>",
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "updateMetadata"))
            .and(body_string_contains(
                "<met:description>  two leading spaces\n</met:description>",
            ))
            .and(body_string_contains("<met:label>a &lt;b&gt; c</met:label>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                "<updateMetadataResponse><result><fullName>Sync1__c</fullName><success>true</success></result></updateMetadataResponse>",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let record = client
            .read_metadata_one("CustomObject", "Sync1__c")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.get("description"), Some(&json!("  two leading spaces\n")));
        assert_eq!(record.get("label"), Some(&json!("a <b> c")));

        let results = client
            .update_metadata("CustomObject", &[record])
            .await
            .unwrap();
        assert!(results[0].success);
    }

    #[tokio::test]
    async fn test_read_metadata_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string(soap(
                "<soapenv:Fault><faultcode>sf:INVALID_TYPE</faultcode><faultstring>INVALID_TYPE: Unknown type name 'Nope'</faultstring></soapenv:Fault>",
            )))
            .mount(&server)
            .await;

        let err = client(&server)
            .read_metadata_one("Nope", "X")
            .await
            .unwrap_err();
        assert_eq!(err.soap_fault().unwrap().fault_code, "sf:INVALID_TYPE");
    }

    #[tokio::test]
    async fn test_upsert_reports_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "upsertMetadata"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                "<upsertMetadataResponse>\
                   <result><created>false</created><fullName>Sync2__c</fullName><success>true</success></result>\
                   <result><created>true</created><fullName>Sync3__c</fullName><success>true</success></result>\
                 </upsertMetadataResponse>",
            )))
            .mount(&server)
            .await;

        let results = client(&server)
            .upsert_metadata("CustomObject", &[object("Sync2__c"), object("Sync3__c")])
            .await
            .unwrap();
        assert!(!results[0].created);
        assert!(results[1].created);
    }

    #[tokio::test]
    async fn test_rename_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "renameMetadata"))
            .and(body_string_contains("<met:oldFullName>Sync1__c</met:oldFullName>"))
            .and(body_string_contains("<met:newFullName>Renamed__c</met:newFullName>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                "<renameMetadataResponse><result><fullName>Sync1__c</fullName><success>true</success></result></renameMetadataResponse>",
            )))
            .mount(&server)
            .await;

        let result = client(&server)
            .rename_metadata("CustomObject", "Sync1__c", "Renamed__c")
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.full_name, "Sync1__c");
    }

    #[tokio::test]
    async fn test_delete_missing_name_is_failure_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "deleteMetadata"))
            .respond_with(ResponseTemplate::new(200).set_body_string(soap(
                "<deleteMetadataResponse><result>\
                   <errors><message>no CustomObject named Gone__c found</message><statusCode>INVALID_CROSS_REFERENCE_KEY</statusCode></errors>\
                   <fullName>Gone__c</fullName><success>false</success>\
                 </result></deleteMetadataResponse>",
            )))
            .mount(&server)
            .await;

        let results = client(&server)
            .delete_metadata("CustomObject", &["Gone__c"])
            .await
            .unwrap();
        assert!(!results[0].success);
        assert_eq!(results[0].errors[0].status_code, "INVALID_CROSS_REFERENCE_KEY");
    }
}
