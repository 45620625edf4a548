//! Retrieve operations.

use bytes::Bytes;
use forcemeta_client::security::xml;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::types::FileProperties;

/// What to retrieve.
///
/// At least one of `package_names`, `unpackaged` or `specific_files` must be
/// set.
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    /// Names of packages in the org.
    pub package_names: Vec<String>,
    /// Components listed by type, as in a `package.xml`.
    pub unpackaged: Option<PackageManifest>,
    /// Individual file paths within a package.
    pub specific_files: Vec<String>,
    /// Retrieve as a single package rather than one folder per package.
    pub single_package: bool,
    /// API version for the retrieved files. Defaults to the client's version.
    pub api_version: Option<String>,
}

impl RetrieveOptions {
    pub fn packages<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            package_names: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn unpackaged(manifest: PackageManifest) -> Self {
        Self {
            unpackaged: Some(manifest),
            ..Default::default()
        }
    }

    pub fn with_specific_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specific_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_single_package(mut self, single: bool) -> Self {
        self.single_package = single;
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let manifest_empty = self
            .unpackaged
            .as_ref()
            .map_or(true, |m| m.types.is_empty());
        if self.package_names.is_empty() && manifest_empty && self.specific_files.is_empty() {
            return Err(Error::new(ErrorKind::InvalidRequest(
                "retrieve needs package names, an unpackaged manifest or specific files"
                    .to_string(),
            )));
        }
        Ok(())
    }

    /// Body of the `retrieveRequest` element. Every value is escaped.
    pub(crate) fn to_xml(&self, default_api_version: &str) -> String {
        let mut parts = vec![format!(
            "<met:apiVersion>{}</met:apiVersion>",
            xml::escape(self.api_version.as_deref().unwrap_or(default_api_version))
        )];
        parts.extend(
            self.package_names
                .iter()
                .map(|p| format!("<met:packageNames>{}</met:packageNames>", xml::escape(p))),
        );
        parts.push(format!(
            "<met:singlePackage>{}</met:singlePackage>",
            self.single_package
        ));
        parts.extend(
            self.specific_files
                .iter()
                .map(|f| format!("<met:specificFiles>{}</met:specificFiles>", xml::escape(f))),
        );
        if let Some(manifest) = &self.unpackaged {
            parts.push(format!("<met:unpackaged>{}</met:unpackaged>", manifest.to_xml()));
        }
        parts.join("\n        ")
    }
}

/// Package manifest (package.xml).
///
/// Use this structured type to build manifests without risk of XML
/// injection. All values are escaped when converted to XML.
#[derive(Debug, Clone, Default)]
pub struct PackageManifest {
    pub types: Vec<PackageTypeMembers>,
    pub version: String,
}

impl PackageManifest {
    /// Create a new package manifest with the given API version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            types: Vec::new(),
            version: version.into(),
        }
    }

    /// Add a metadata type with its members.
    pub fn add_type<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.push(PackageTypeMembers {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub(crate) fn to_xml(&self) -> String {
        let mut parts: Vec<String> = self
            .types
            .iter()
            .map(|t| {
                let members: String = t
                    .members
                    .iter()
                    .map(|m| format!("<met:members>{}</met:members>", xml::escape(m)))
                    .collect();
                format!(
                    "<met:types>{}<met:name>{}</met:name></met:types>",
                    members,
                    xml::escape(&t.name)
                )
            })
            .collect();
        parts.push(format!("<met:version>{}</met:version>", xml::escape(&self.version)));
        parts.concat()
    }
}

/// Type members in a package manifest.
#[derive(Debug, Clone)]
pub struct PackageTypeMembers {
    pub name: String,
    pub members: Vec<String>,
}

/// Retrieve status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrieveStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl std::str::FromStr for RetrieveStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RetrieveStatus::Pending),
            "InProgress" => Ok(RetrieveStatus::InProgress),
            "Succeeded" => Ok(RetrieveStatus::Succeeded),
            "Failed" => Ok(RetrieveStatus::Failed),
            _ => Err(format!("Unknown retrieve status: {}", s)),
        }
    }
}

impl std::fmt::Display for RetrieveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Result of a retrieval.
#[derive(Debug, Clone)]
pub struct RetrieveResult {
    /// Async process ID.
    pub id: String,
    /// Whether the operation is complete.
    pub done: bool,
    /// Current status.
    pub status: RetrieveStatus,
    /// Whether the retrieve succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error_message: Option<String>,
    /// Error status code if failed.
    pub error_status_code: Option<String>,
    /// Decoded zip archive, present once done when requested.
    pub zip_file: Option<Bytes>,
    /// File properties in the retrieved package.
    pub file_properties: Vec<FileProperties>,
    /// Retrieve messages (warnings/errors).
    pub messages: Vec<RetrieveMessage>,
}

impl RetrieveResult {
    /// Take the archive out of a successful result.
    pub fn into_archive(self) -> Result<Bytes> {
        if self.status != RetrieveStatus::Succeeded {
            let message = self
                .error_message
                .or_else(|| self.messages.first().map(|m| m.problem.clone()))
                .unwrap_or_else(|| format!("retrieve {} ended with status {}", self.id, self.status));
            return Err(Error::new(ErrorKind::RetrieveFailed(message)));
        }

        match self.zip_file {
            Some(zip) if !zip.is_empty() => Ok(zip),
            _ => Err(Error::new(ErrorKind::InvalidResponse(format!(
                "retrieve {} succeeded without an archive",
                self.id
            )))),
        }
    }
}

/// A message from retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveMessage {
    pub file_name: String,
    pub problem: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: RetrieveStatus, zip: Option<&'static [u8]>) -> RetrieveResult {
        RetrieveResult {
            id: "09S000000000001".to_string(),
            done: true,
            status,
            success: status == RetrieveStatus::Succeeded,
            error_message: None,
            error_status_code: None,
            zip_file: zip.map(Bytes::from_static),
            file_properties: vec![],
            messages: vec![],
        }
    }

    #[test]
    fn test_retrieve_status_parse() {
        assert_eq!(
            "InProgress".parse::<RetrieveStatus>().unwrap(),
            RetrieveStatus::InProgress
        );
        assert_eq!(
            "Succeeded".parse::<RetrieveStatus>().unwrap(),
            RetrieveStatus::Succeeded
        );
        assert!("Done".parse::<RetrieveStatus>().is_err());
    }

    #[test]
    fn test_package_manifest_to_xml() {
        let manifest = PackageManifest::new("62.0")
            .add_type("ApexClass", ["MyClass", "OtherClass"])
            .add_type("ApexTrigger", ["*"]);

        let xml = manifest.to_xml();
        assert!(xml.contains(
            "<met:types><met:members>MyClass</met:members><met:members>OtherClass</met:members><met:name>ApexClass</met:name></met:types>"
        ));
        assert!(xml.contains("<met:members>*</met:members>"));
        assert!(xml.ends_with("<met:version>62.0</met:version>"));
    }

    #[test]
    fn test_package_manifest_escapes_injection() {
        let manifest = PackageManifest::new("62.0").add_type(
            "<script>",
            ["</met:members><malicious>attack</malicious>"],
        );

        let xml = manifest.to_xml();
        assert!(xml.contains("&lt;/met:members&gt;"));
        assert!(xml.contains("&lt;script&gt;"));
        assert!(!xml.contains("<malicious>"));
    }

    #[test]
    fn test_options_require_something_to_retrieve() {
        let err = RetrieveOptions::default().validate().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidRequest(_)));

        let err = RetrieveOptions::unpackaged(PackageManifest::new("62.0"))
            .validate()
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidRequest(_)));

        assert!(RetrieveOptions::packages(["My Test Package"]).validate().is_ok());
        assert!(RetrieveOptions::default()
            .with_specific_files(["classes/Foo.cls"])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_options_to_xml() {
        let xml = RetrieveOptions::packages(["A & B"])
            .with_single_package(true)
            .to_xml("62.0");
        assert!(xml.contains("<met:apiVersion>62.0</met:apiVersion>"));
        assert!(xml.contains("<met:packageNames>A &amp; B</met:packageNames>"));
        assert!(xml.contains("<met:singlePackage>true</met:singlePackage>"));
        assert!(!xml.contains("unpackaged"));

        let xml = RetrieveOptions::packages(["P"])
            .with_api_version("58.0")
            .to_xml("62.0");
        assert!(xml.contains("<met:apiVersion>58.0</met:apiVersion>"));
    }

    #[test]
    fn test_into_archive() {
        let zip = result(RetrieveStatus::Succeeded, Some(b"PK\x03\x04"))
            .into_archive()
            .unwrap();
        assert_eq!(&zip[..], b"PK\x03\x04");

        let err = result(RetrieveStatus::Succeeded, None)
            .into_archive()
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidResponse(_)));

        let mut failed = result(RetrieveStatus::Failed, None);
        failed.error_message = Some("No package named 'Nope' found".to_string());
        let err = failed.into_archive().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RetrieveFailed(ref m) if m.contains("Nope")));
    }
}
