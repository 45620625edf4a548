//! Metadata component records.
//!
//! A [`MetadataRecord`] is an ordered field map, which is what the CRUD calls
//! send and receive. Typed shapes such as [`CustomObject`] convert to and from
//! records through serde, so callers can pick whichever is more convenient.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// One metadata component as an ordered mapping of field name to value.
///
/// Field order is kept when the record is written to a request, since the
/// Metadata API schema is sequence-ordered. The component's identity is its
/// `fullName` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord(Map<String, Value>);

impl MetadataRecord {
    /// Create a record with only a `fullName`.
    pub fn new(full_name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("fullName".to_string(), Value::String(full_name.into()));
        Self(fields)
    }

    pub fn full_name(&self) -> Option<&str> {
        self.0.get("fullName").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, keeping its position if it already exists.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Build a record from any serializable shape. The shape must serialize
    /// to a JSON object.
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self> {
        Self::try_from(serde_json::to_value(value)?)
    }

    /// Convert into a typed shape.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0))?)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for MetadataRecord {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::new(ErrorKind::Serialization(format!(
                "metadata record must be an object, got {}",
                other
            )))),
        }
    }
}

impl From<Map<String, Value>> for MetadataRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Deployment status of a custom object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStatus {
    Deployed,
    InDevelopment,
}

/// Org-wide sharing default for a custom object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharingModel {
    Private,
    Read,
    ReadWrite,
    ReadWriteTransfer,
    FullAccess,
    ControlledByParent,
    ControlledByCampaign,
    ControlledByLeadOrContact,
}

/// The record-name field of a custom object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameField {
    /// `Text` or `AutoNumber`.
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_format: Option<String>,
}

/// Typed `CustomObject` component.
///
/// Only the commonly used fields are named; anything else the service
/// returns is kept in `other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomObject {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_field: Option<NameField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_status: Option<DeploymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing_model: Option<SharingModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl CustomObject {
    /// A deployed, private object with a text name field.
    pub fn new(full_name: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            full_name: full_name.into(),
            plural_label: Some(label.clone()),
            name_field: Some(NameField {
                field_type: "Text".to_string(),
                label: format!("{} Name", label),
                display_format: None,
            }),
            label: Some(label),
            deployment_status: Some(DeploymentStatus::Deployed),
            sharing_model: Some(SharingModel::Private),
            description: None,
            other: Map::new(),
        }
    }
}
