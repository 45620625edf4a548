//! Response parsing: SOAP body extraction and one parser per result type.

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde_json::Value;
use tracing::warn;

use crate::deploy::{CancelDeployResult, DeployResult, DeployStatus};
use crate::describe::{DescribeMetadataResult, MetadataType};
use crate::error::{Error, ErrorKind, Result};
use crate::record::MetadataRecord;
use crate::retrieve::{RetrieveMessage, RetrieveResult, RetrieveStatus};
use crate::types::{
    ComponentFailure, ComponentSuccess, FileProperties, MetadataError, SaveResult, SoapFault,
    TestFailure, UpsertResult,
};
use crate::xml::XmlElement;

/// Parse a response and return its `{operation}Response` element, or the
/// SOAP fault it carries as an error.
pub(crate) fn response_body(xml: &str, operation: &str) -> Result<XmlElement> {
    let root = XmlElement::parse(xml)?;
    let body = root
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .ok_or_else(|| invalid("response has no SOAP Body"))?;

    if let Some(fault) = body.child("Fault") {
        let fault = SoapFault {
            fault_code: fault.child_string("faultcode").unwrap_or_default(),
            fault_string: fault
                .child_string("faultstring")
                .unwrap_or_else(|| "Unknown error".to_string()),
        };
        warn!(operation, fault_code = %fault.fault_code, "Metadata API returned a fault");
        return Err(Error::new(ErrorKind::SoapFault(fault)));
    }

    let expected = format!("{}Response", operation);
    body.children
        .into_iter()
        .find(|c| c.name == expected)
        .ok_or_else(|| invalid(&format!("missing {} element", expected)))
}

pub(crate) fn save_results(response: &XmlElement) -> Vec<SaveResult> {
    response.children_named("result").map(save_result).collect()
}

pub(crate) fn save_result(result: &XmlElement) -> SaveResult {
    SaveResult {
        full_name: result.child_string("fullName").unwrap_or_default(),
        success: result.child_bool("success"),
        errors: result.children_named("errors").map(metadata_error).collect(),
    }
}

pub(crate) fn upsert_results(response: &XmlElement) -> Vec<UpsertResult> {
    response
        .children_named("result")
        .map(|result| UpsertResult {
            full_name: result.child_string("fullName").unwrap_or_default(),
            success: result.child_bool("success"),
            created: result.child_bool("created"),
            errors: result.children_named("errors").map(metadata_error).collect(),
        })
        .collect()
}

fn metadata_error(error: &XmlElement) -> MetadataError {
    MetadataError {
        status_code: error.child_string("statusCode").unwrap_or_default(),
        message: error.child_string("message").unwrap_or_default(),
        fields: error.children_named("fields").map(|f| f.text.clone()).collect(),
    }
}

/// Records in the order the service returned them. Entries that are nil or
/// carry no `fullName` stand for names that do not exist.
pub(crate) fn read_records(response: &XmlElement) -> Vec<Option<MetadataRecord>> {
    let Some(result) = response.child("result") else {
        return Vec::new();
    };
    result
        .children_named("records")
        .map(|records| match records.to_json() {
            Value::Object(fields) => {
                let record = MetadataRecord::from(fields);
                record.full_name().is_some().then_some(record)
            }
            _ => None,
        })
        .collect()
}

/// `id` of an `AsyncResult`, returned by deploy and retrieve.
pub(crate) fn async_id(response: &XmlElement) -> Result<String> {
    response
        .find(&["result", "id"])
        .map(|id| id.text.clone())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid("no async process ID in response"))
}

pub(crate) fn deploy_result(response: &XmlElement) -> Result<DeployResult> {
    let result = result_element(response)?;
    let status_text = required(result, "status")?;
    let status: DeployStatus = status_text.parse().map_err(|e: String| invalid(&e))?;

    let details = result.child("details");
    let in_details = |name: &'static str| {
        details
            .into_iter()
            .flat_map(move |d| d.children_named(name))
    };

    Ok(DeployResult {
        id: required(result, "id")?,
        done: result.child_bool("done"),
        status,
        success: result.child_bool("success"),
        check_only: result.child_bool("checkOnly"),
        error_message: result.child_string("errorMessage"),
        number_components_deployed: result.child_parse("numberComponentsDeployed").unwrap_or(0),
        number_components_errors: result.child_parse("numberComponentErrors").unwrap_or(0),
        number_components_total: result.child_parse("numberComponentsTotal").unwrap_or(0),
        number_tests_completed: result.child_parse("numberTestsCompleted").unwrap_or(0),
        number_tests_errors: result.child_parse("numberTestErrors").unwrap_or(0),
        number_tests_total: result.child_parse("numberTestsTotal").unwrap_or(0),
        created_date: result.child_parse("createdDate"),
        completed_date: result.child_parse("completedDate"),
        component_failures: in_details("componentFailures")
            .map(component_failure)
            .collect(),
        component_successes: in_details("componentSuccesses")
            .map(component_success)
            .collect(),
        test_failures: details
            .and_then(|d| d.child("runTestResult"))
            .map(|r| r.children_named("failures").map(test_failure).collect())
            .unwrap_or_default(),
        state_detail: result.child_string("stateDetail"),
    })
}

fn component_failure(el: &XmlElement) -> ComponentFailure {
    ComponentFailure {
        component_type: el.child_string("componentType"),
        file_name: el.child_string("fileName"),
        full_name: el.child_string("fullName"),
        line_number: el.child_parse("lineNumber"),
        column_number: el.child_parse("columnNumber"),
        problem: el.child_string("problem").unwrap_or_default(),
        problem_type: el.child_string("problemType").unwrap_or_default(),
    }
}

fn component_success(el: &XmlElement) -> ComponentSuccess {
    ComponentSuccess {
        component_type: el.child_string("componentType"),
        file_name: el.child_string("fileName"),
        full_name: el.child_string("fullName"),
        created: el.child_bool("created"),
        deleted: el.child_bool("deleted"),
    }
}

fn test_failure(el: &XmlElement) -> TestFailure {
    TestFailure {
        name: el.child_string("name"),
        method_name: el.child_string("methodName"),
        message: el.child_string("message"),
        stack_trace: el.child_string("stackTrace"),
        namespace: el.child_string("namespace"),
    }
}

pub(crate) fn cancel_deploy_result(response: &XmlElement) -> Result<CancelDeployResult> {
    let result = result_element(response)?;
    Ok(CancelDeployResult {
        id: required(result, "id")?,
        done: result.child_bool("done"),
    })
}

pub(crate) fn retrieve_result(response: &XmlElement) -> Result<RetrieveResult> {
    let result = result_element(response)?;
    let status_text = required(result, "status")?;
    let status: RetrieveStatus = status_text.parse().map_err(|e: String| invalid(&e))?;

    let zip_file = match result.child_text("zipFile") {
        Some(encoded) if !encoded.trim().is_empty() => {
            let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            Some(Bytes::from(general_purpose::STANDARD.decode(compact)?))
        }
        _ => None,
    };

    Ok(RetrieveResult {
        id: required(result, "id")?,
        done: result.child_bool("done"),
        status,
        success: result.child_bool("success"),
        error_message: result.child_string("errorMessage"),
        error_status_code: result.child_string("errorStatusCode"),
        zip_file,
        file_properties: result
            .children_named("fileProperties")
            .map(file_properties)
            .collect(),
        messages: result
            .children_named("messages")
            .map(|m| RetrieveMessage {
                file_name: m.child_string("fileName").unwrap_or_default(),
                problem: m.child_string("problem").unwrap_or_default(),
            })
            .collect(),
    })
}

pub(crate) fn file_properties(el: &XmlElement) -> FileProperties {
    FileProperties {
        full_name: el.child_string("fullName").unwrap_or_default(),
        file_name: el.child_string("fileName").unwrap_or_default(),
        component_type: el.child_string("type").unwrap_or_default(),
        id: el.child_string("id"),
        created_by_id: el.child_string("createdById"),
        created_by_name: el.child_string("createdByName"),
        created_date: el.child_parse("createdDate"),
        last_modified_by_id: el.child_string("lastModifiedById"),
        last_modified_by_name: el.child_string("lastModifiedByName"),
        last_modified_date: el.child_parse("lastModifiedDate"),
        manageable_state: el.child_string("manageableState"),
        namespace_prefix: el.child_string("namespacePrefix").filter(|s| !s.is_empty()),
    }
}

pub(crate) fn list_results(response: &XmlElement) -> Vec<FileProperties> {
    response
        .children_named("result")
        .map(file_properties)
        .collect()
}

pub(crate) fn describe_result(response: &XmlElement) -> Result<DescribeMetadataResult> {
    let result = result_element(response)?;
    Ok(DescribeMetadataResult {
        metadata_objects: result
            .children_named("metadataObjects")
            .map(|t| MetadataType {
                xml_name: t.child_string("xmlName").unwrap_or_default(),
                directory_name: t.child_string("directoryName"),
                suffix: t.child_string("suffix"),
                meta_file: t.child_bool("metaFile"),
                in_folder: t.child_bool("inFolder"),
                child_xml_names: t
                    .children_named("childXmlNames")
                    .map(|c| c.text.clone())
                    .collect(),
            })
            .collect(),
        organization_namespace: result
            .child_string("organizationNamespace")
            .filter(|s| !s.is_empty()),
        partial_save_allowed: result.child_bool("partialSaveAllowed"),
        test_required: result.child_bool("testRequired"),
    })
}

fn result_element(response: &XmlElement) -> Result<&XmlElement> {
    response
        .child("result")
        .ok_or_else(|| invalid(&format!("{} has no result", response.name)))
}

fn required(el: &XmlElement, name: &str) -> Result<String> {
    el.child_string(name)
        .ok_or_else(|| invalid(&format!("{} is missing {}", el.name, name)))
}

fn invalid(message: &str) -> Error {
    Error::new(ErrorKind::InvalidResponse(message.to_string()))
}
