//! List metadata operations.

use forcemeta_client::security::xml;

/// One `ListMetadataQuery`: a metadata type and, for foldered types such as
/// `Report` or `EmailTemplate`, the folder to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMetadataQuery {
    pub metadata_type: String,
    pub folder: Option<String>,
}

impl ListMetadataQuery {
    pub fn new(metadata_type: impl Into<String>) -> Self {
        Self {
            metadata_type: metadata_type.into(),
            folder: None,
        }
    }

    pub fn in_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub(crate) fn to_xml(&self) -> String {
        let folder = self
            .folder
            .as_deref()
            .map(|f| format!("<met:folder>{}</met:folder>", xml::escape(f)))
            .unwrap_or_default();
        format!(
            "<met:queries>{}<met:type>{}</met:type></met:queries>",
            folder,
            xml::escape(&self.metadata_type)
        )
    }
}
