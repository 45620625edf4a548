//! Result and option types shared by the Metadata API calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use forcemeta_client::DEFAULT_API_VERSION;

/// Components per create/read/update/upsert/delete call.
pub const MAX_CRUD_COMPONENTS: usize = 10;

/// Queries per `listMetadata` call.
pub const MAX_LIST_QUERIES: usize = 3;

/// Which Apex tests a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestLevel {
    NoTestRun,
    RunLocalTests,
    RunAllTestsInOrg,
    /// Only the classes named in `DeployOptions::run_tests`.
    RunSpecifiedTests,
}

impl TestLevel {
    /// Name used in `<met:testLevel>`.
    pub fn as_str(self) -> &'static str {
        match self {
            TestLevel::NoTestRun => "NoTestRun",
            TestLevel::RunLocalTests => "RunLocalTests",
            TestLevel::RunAllTestsInOrg => "RunAllTestsInOrg",
            TestLevel::RunSpecifiedTests => "RunSpecifiedTests",
        }
    }
}

impl std::fmt::Display for TestLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        [
            TestLevel::NoTestRun,
            TestLevel::RunLocalTests,
            TestLevel::RunAllTestsInOrg,
            TestLevel::RunSpecifiedTests,
        ]
        .into_iter()
        .find(|level| level.as_str() == s)
        .ok_or_else(|| format!("Unknown test level: {}", s))
    }
}

/// The body of a `soapenv:Fault`: the whole call was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapFault {
    /// Qualified code such as `sf:INVALID_TYPE`.
    pub fault_code: String,
    pub fault_string: String,
}

impl SoapFault {
    /// The exception code without its namespace prefix (`INVALID_TYPE`).
    pub fn code(&self) -> &str {
        self.fault_code
            .rsplit_once(':')
            .map_or(self.fault_code.as_str(), |(_, code)| code)
    }
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} fault: {}", self.fault_code, self.fault_string)
    }
}

impl std::error::Error for SoapFault {}

/// Why one component in a CRUD call was not saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataError {
    /// e.g. `DUPLICATE_DEVELOPER_NAME`, `INVALID_CROSS_REFERENCE_KEY`.
    pub status_code: String,
    pub message: String,
    /// Record fields the error refers to, if any.
    pub fields: Vec<String>,
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status_code, self.message)
    }
}

/// Outcome for one component of a create, update, rename or delete.
///
/// `success == false` is an answer, not a call failure; the reasons are in
/// `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub full_name: String,
    pub success: bool,
    pub errors: Vec<MetadataError>,
}

impl SaveResult {
    pub fn first_error(&self) -> Option<&MetadataError> {
        self.errors.first()
    }
}

/// Outcome for one component of an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertResult {
    pub full_name: String,
    pub success: bool,
    /// `true` when no component with this `fullName` existed before.
    pub created: bool,
    pub errors: Vec<MetadataError>,
}

impl UpsertResult {
    pub fn first_error(&self) -> Option<&MetadataError> {
        self.errors.first()
    }
}

pub type DeleteResult = SaveResult;

/// A file in a deploy archive that was saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSuccess {
    pub component_type: Option<String>,
    pub file_name: Option<String>,
    pub full_name: Option<String>,
    pub created: bool,
    pub deleted: bool,
}

/// A file in a deploy archive that was rejected, with the compiler's
/// position when there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFailure {
    pub component_type: Option<String>,
    pub file_name: Option<String>,
    pub full_name: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub problem: String,
    /// `Error` or `Warning`.
    pub problem_type: String,
}

impl ComponentFailure {
    /// `file:line:column`, with whatever parts are known.
    pub fn location(&self) -> String {
        let file = self
            .file_name
            .as_deref()
            .or(self.full_name.as_deref())
            .unwrap_or("<unknown>");
        match (self.line_number, self.column_number) {
            (Some(line), Some(column)) => format!("{file}:{line}:{column}"),
            (Some(line), None) => format!("{file}:{line}"),
            _ => file.to_string(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.problem_type == "Warning"
    }
}

/// An Apex test method that failed during a deploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFailure {
    /// Test class.
    pub name: Option<String>,
    pub method_name: Option<String>,
    pub message: Option<String>,
    pub stack_trace: Option<String>,
    pub namespace: Option<String>,
}

/// A component as listed by `listMetadata` or described in a retrieve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProperties {
    pub full_name: String,
    /// Path inside a retrieve archive, e.g. `objects/Account.object`.
    pub file_name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub id: Option<String>,
    pub created_by_id: Option<String>,
    pub created_by_name: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub last_modified_by_id: Option<String>,
    pub last_modified_by_name: Option<String>,
    pub last_modified_date: Option<DateTime<Utc>>,
    /// `unmanaged`, `installed`, `released`, ...
    pub manageable_state: Option<String>,
    /// Absent for components outside any namespace.
    pub namespace_prefix: Option<String>,
}
