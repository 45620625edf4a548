//! Metadata API tests against a live org.

use super::common::{get_credentials, trigger_package};
use forcemeta::metadata::{
    CustomObject, DeployOptions, DeployStatus, ListMetadataQuery, MetadataClient, MetadataRecord,
    RetrieveOptions,
};
use forcemeta::Credentials;
use futures::StreamExt;

const SYNC1: &str = "TestObjectSync1__c";
const SYNC2: &str = "TestObjectSync2__c";
const SYNC3: &str = "TestObjectSync3__c";
const RENAMED: &str = "UpdatedTestObjectSync1__c";

fn client() -> MetadataClient {
    MetadataClient::new(&get_credentials()).expect("Failed to create Metadata client")
}

fn custom_object(full_name: &str, label: &str) -> MetadataRecord {
    MetadataRecord::from_typed(&CustomObject::new(full_name, label)).expect("record from typed")
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_metadata_crud_sequence() {
    let client = client();

    // Leftovers from an aborted run; failures here are expected.
    let _ = client
        .delete_metadata("CustomObject", &[SYNC1, SYNC2, SYNC3, RENAMED])
        .await;

    let created = client
        .create_metadata(
            "CustomObject",
            &[
                custom_object(SYNC1, "Test Object Sync 1"),
                custom_object(SYNC2, "Test Object Sync 2"),
            ],
        )
        .await
        .expect("createMetadata should succeed");
    assert_eq!(created.len(), 2);
    for result in &created {
        assert!(result.success, "create failed: {:?}", result.errors);
    }

    let read = client
        .read_metadata_as::<CustomObject>("CustomObject", &[SYNC1, SYNC2])
        .await
        .expect("readMetadata should succeed");
    assert_eq!(read.len(), 2);
    for (object, name) in read.iter().zip([SYNC1, SYNC2]) {
        let object = object.as_ref().expect("created object should be readable");
        assert_eq!(object.full_name, name);
        assert!(object.name_field.as_ref().is_some_and(|f| !f.label.is_empty()));
    }

    // Edit what the org returned and send it back whole.
    let mut sync1 = client
        .read_metadata_one("CustomObject", SYNC1)
        .await
        .expect("readMetadata should succeed")
        .expect("created object should be readable");
    sync1.set("label", "Updated Test Object Sync 1");
    sync1.set("description", "updated by integration test");
    let updated = client
        .update_metadata("CustomObject", std::slice::from_ref(&sync1))
        .await
        .expect("updateMetadata should succeed");
    assert!(updated[0].success, "update failed: {:?}", updated[0].errors);

    let before_rename = client
        .read_metadata_one("CustomObject", SYNC1)
        .await
        .expect("readMetadata should succeed")
        .expect("updated object should be readable");
    assert_eq!(
        before_rename.get("label").and_then(|v| v.as_str()),
        Some("Updated Test Object Sync 1")
    );
    assert_eq!(before_rename.get("nameField"), sync1.get("nameField"));

    let upserted = client
        .upsert_metadata(
            "CustomObject",
            &[
                custom_object(SYNC2, "Upserted Test Object Sync 2"),
                custom_object(SYNC3, "Upserted Test Object Sync 3"),
            ],
        )
        .await
        .expect("upsertMetadata should succeed");
    assert!(upserted.iter().all(|r| r.success));
    assert!(!upserted[0].created, "{SYNC2} already existed");
    assert!(upserted[1].created, "{SYNC3} was new");

    let renamed = client
        .rename_metadata("CustomObject", SYNC1, RENAMED)
        .await
        .expect("renameMetadata should succeed");
    assert!(renamed.success, "rename failed: {:?}", renamed.errors);
    assert_eq!(renamed.full_name, SYNC1);

    let after_rename = client
        .read_metadata_one("CustomObject", RENAMED)
        .await
        .expect("readMetadata should succeed")
        .expect("renamed object should exist");
    assert_eq!(after_rename.full_name(), Some(RENAMED));
    assert_eq!(after_rename, before_rename.with("fullName", RENAMED));

    let deleted = client
        .delete_metadata("CustomObject", &[RENAMED, SYNC2, SYNC3])
        .await
        .expect("deleteMetadata should succeed");
    assert_eq!(deleted.len(), 3);
    for result in &deleted {
        assert!(result.success, "delete failed: {:?}", result.errors);
    }

    let deleted_again = client
        .delete_metadata("CustomObject", &[SYNC3])
        .await
        .expect("deleteMetadata of a missing name is not a call error");
    assert!(!deleted_again[0].success);
}

// ============================================================================
// Deploy / Retrieve
// ============================================================================

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_metadata_deploy_package() {
    let client = client();

    let job = client
        .deploy(
            &trigger_package(),
            DeployOptions::default().run_tests(["MyApexTriggerTest"]),
        )
        .await
        .expect("deploy should be accepted");
    assert!(!job.id().is_empty());

    let result = job.complete().await.expect("deploy should finish");
    assert!(result.done);
    assert!(result.success, "deploy failed: {:?}", result.component_failures);
    assert_eq!(result.status, DeployStatus::Succeeded);
    assert_eq!(result.number_components_errors, 0);
    assert_eq!(
        result.number_components_deployed,
        result.number_components_total
    );
    assert_eq!(result.number_tests_completed, 1);
}

#[tokio::test]
#[ignore = "requires a Salesforce org with a package named 'My Test Package'"]
async fn test_metadata_retrieve_package_stream() {
    let client = client();

    let job = client
        .retrieve(RetrieveOptions::packages(["My Test Package"]))
        .await
        .expect("retrieve should be accepted");

    let mut archive = job.stream();
    let mut chunks = 0;
    let mut bytes = 0;
    while let Some(chunk) = archive.next().await {
        let chunk = chunk.expect("retrieve stream should not fail");
        chunks += 1;
        bytes += chunk.len();
    }
    assert!(chunks > 0, "archive stream should yield data");
    assert!(bytes > 0);
}

// ============================================================================
// List / Describe
// ============================================================================

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_metadata_describe_and_list() {
    let client = client();

    let types = client
        .list_metadata_types()
        .await
        .expect("describeMetadata should succeed");
    assert!(types.iter().any(|t| t.xml_name == "CustomObject"));

    let objects = client
        .list_metadata(&[ListMetadataQuery::new("CustomObject")])
        .await
        .expect("listMetadata should succeed");
    for component in &objects {
        assert_eq!(component.component_type, "CustomObject");
        assert!(!component.full_name.is_empty());
    }
}

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_metadata_invalid_token_is_fault() {
    let creds = get_credentials();
    let client = MetadataClient::from_parts(creds.instance_url(), "invalid-token")
        .expect("client")
        .with_api_version(creds.api_version());

    let err = client
        .describe_metadata()
        .await
        .expect_err("describe with an invalid token should fail");
    let fault = err.soap_fault().expect("invalid session is reported as a fault");
    assert!(fault.fault_code.contains("INVALID_SESSION_ID"));
}
