use std::io::Write;
use std::sync::Once;

use forcemeta::SalesforceCredentials;

static TRACING: Once = Once::new();

/// Install a `tracing` subscriber once per test binary. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "forcemeta_metadata=debug,forcemeta_client=info".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Credentials for an org the tests may modify.
///
/// Panics with setup instructions when `SF_INSTANCE_URL` / `SF_ACCESS_TOKEN`
/// are missing: these tests are `#[ignore]`d and only run on request.
pub fn get_credentials() -> SalesforceCredentials {
    init_tracing();
    match SalesforceCredentials::from_env() {
        Ok(creds) => creds,
        Err(err) => panic!(
            "\n\nIntegration tests need a Salesforce org: {err}\n\
             \n  sf org display --target-org <alias> --json\
             \n  export SF_INSTANCE_URL=<instanceUrl>\
             \n  export SF_ACCESS_TOKEN=<accessToken>\n\n"
        ),
    }
}

/// The package deployed by the deploy test: an Account trigger plus the
/// test class that covers it.
pub fn trigger_package() -> Vec<u8> {
    let files: [(&str, &str); 5] = [
        (
            "package.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Package xmlns="http://soap.sforce.com/2006/04/metadata">
    <types>
        <members>MyApexTriggerTest</members>
        <name>ApexClass</name>
    </types>
    <types>
        <members>MyApexTrigger</members>
        <name>ApexTrigger</name>
    </types>
    <version>62.0</version>
</Package>"#,
        ),
        (
            "triggers/MyApexTrigger.trigger",
            "trigger MyApexTrigger on Account (before insert) {\n    for (Account a : Trigger.new) {\n        a.Description = 'Inserted by MyApexTrigger';\n    }\n}\n",
        ),
        (
            "triggers/MyApexTrigger.trigger-meta.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ApexTrigger xmlns="http://soap.sforce.com/2006/04/metadata">
    <apiVersion>62.0</apiVersion>
    <status>Active</status>
</ApexTrigger>"#,
        ),
        (
            "classes/MyApexTriggerTest.cls",
            "@isTest\nprivate class MyApexTriggerTest {\n    @isTest\n    static void setsDescription() {\n        Account a = new Account(Name = 'Trigger Test');\n        insert a;\n        a = [SELECT Description FROM Account WHERE Id = :a.Id];\n        System.assertEquals('Inserted by MyApexTrigger', a.Description);\n    }\n}\n",
        ),
        (
            "classes/MyApexTriggerTest.cls-meta.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ApexClass xmlns="http://soap.sforce.com/2006/04/metadata">
    <apiVersion>62.0</apiVersion>
    <status>Active</status>
</ApexClass>"#,
        ),
    ];

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, contents) in files {
            zip.start_file(name, options)
                .expect("start zip entry");
            zip.write_all(contents.as_bytes()).expect("write zip entry");
        }
        zip.finish().expect("finish zip");
    }
    buf
}
