//! Types returned by `describeMetadata`.

use serde::{Deserialize, Serialize};

/// The org's view of the Metadata API at a given version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeMetadataResult {
    pub metadata_objects: Vec<MetadataType>,
    pub organization_namespace: Option<String>,
    pub partial_save_allowed: bool,
    pub test_required: bool,
}

impl DescribeMetadataResult {
    /// Look up a type by its XML name, e.g. `CustomObject`.
    pub fn find_type(&self, xml_name: &str) -> Option<&MetadataType> {
        self.metadata_objects.iter().find(|t| t.xml_name == xml_name)
    }

    /// Types whose components live in folders and must be listed per folder.
    pub fn folder_types(&self) -> impl Iterator<Item = &MetadataType> {
        self.metadata_objects.iter().filter(|t| t.in_folder)
    }

    /// The top-level type that declares `child` (e.g. `CustomField` -> `CustomObject`).
    pub fn parent_of(&self, child: &str) -> Option<&MetadataType> {
        self.metadata_objects
            .iter()
            .find(|t| t.child_xml_names.iter().any(|c| c == child))
    }
}

/// One metadata type as described by the org.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataType {
    /// Name used in `package.xml` and CRUD calls.
    pub xml_name: String,
    /// Directory inside a deploy/retrieve archive.
    pub directory_name: Option<String>,
    pub suffix: Option<String>,
    /// Whether each file has a companion `-meta.xml`.
    pub meta_file: bool,
    pub in_folder: bool,
    pub child_xml_names: Vec<String>,
}

impl MetadataType {
    /// Archive path of a component of this type, when the type has a directory.
    ///
    /// ```rust,ignore
    /// assert_eq!(apex_class.archive_path("Foo").as_deref(), Some("classes/Foo.cls"));
    /// ```
    pub fn archive_path(&self, full_name: &str) -> Option<String> {
        let dir = self.directory_name.as_deref()?;
        Some(match self.suffix.as_deref() {
            Some(suffix) => format!("{dir}/{full_name}.{suffix}"),
            None => format!("{dir}/{full_name}"),
        })
    }
}
