//! Deploy operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{ComponentFailure, ComponentSuccess, TestFailure, TestLevel};

/// Options for deployment.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Allow references to missing files in the zip.
    pub allow_missing_files: bool,
    /// Automatically update the package manifest.
    pub auto_update_package: bool,
    /// Validate only, don't actually deploy.
    pub check_only: bool,
    /// Ignore warnings during deployment.
    pub ignore_warnings: bool,
    /// Retrieve metadata after deploy.
    pub perform_retrieve: bool,
    /// Hard delete components (only in sandbox/DE orgs).
    pub purge_on_delete: bool,
    /// Rollback all changes if any component fails.
    pub rollback_on_error: bool,
    /// Run all Apex tests. Superseded by `test_level` on current API versions.
    pub run_all_tests: bool,
    /// Deploy as a single package.
    pub single_package: bool,
    /// Test level for deployment.
    pub test_level: Option<TestLevel>,
    /// Specific tests to run. Implies `RunSpecifiedTests` when no level is set.
    pub run_tests: Vec<String>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            allow_missing_files: false,
            auto_update_package: false,
            check_only: false,
            ignore_warnings: true,
            perform_retrieve: false,
            purge_on_delete: false,
            rollback_on_error: true,
            run_all_tests: false,
            single_package: true,
            test_level: None,
            run_tests: vec![],
        }
    }
}

impl DeployOptions {
    pub fn check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }

    pub fn rollback_on_error(mut self, rollback: bool) -> Self {
        self.rollback_on_error = rollback;
        self
    }

    pub fn single_package(mut self, single: bool) -> Self {
        self.single_package = single;
        self
    }

    pub fn allow_missing_files(mut self, allow: bool) -> Self {
        self.allow_missing_files = allow;
        self
    }

    pub fn ignore_warnings(mut self, ignore: bool) -> Self {
        self.ignore_warnings = ignore;
        self
    }

    pub fn purge_on_delete(mut self, purge: bool) -> Self {
        self.purge_on_delete = purge;
        self
    }

    pub fn test_level(mut self, level: TestLevel) -> Self {
        self.test_level = Some(level);
        self
    }

    /// Name the Apex test classes to run.
    pub fn run_tests<I, S>(mut self, tests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_tests = tests.into_iter().map(Into::into).collect();
        self
    }

    /// The test level actually sent, after applying the `run_tests` default.
    ///
    /// Naming tests together with a level other than `RunSpecifiedTests` is
    /// rejected because the service would silently ignore the names.
    pub(crate) fn effective_test_level(&self) -> Result<Option<TestLevel>> {
        if self.run_tests.is_empty() {
            return Ok(self.test_level);
        }
        match self.test_level {
            None | Some(TestLevel::RunSpecifiedTests) => Ok(Some(TestLevel::RunSpecifiedTests)),
            Some(other) => Err(Error::new(ErrorKind::InvalidRequest(format!(
                "runTests requires test level RunSpecifiedTests, got {}",
                other
            )))),
        }
    }
}

/// Deployment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployStatus {
    Pending,
    InProgress,
    Succeeded,
    SucceededPartial,
    Failed,
    Canceling,
    Canceled,
}

impl DeployStatus {
    /// No further status changes will happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeployStatus::Succeeded
                | DeployStatus::SucceededPartial
                | DeployStatus::Failed
                | DeployStatus::Canceled
        )
    }
}

impl std::str::FromStr for DeployStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(DeployStatus::Pending),
            "InProgress" => Ok(DeployStatus::InProgress),
            "Succeeded" => Ok(DeployStatus::Succeeded),
            "SucceededPartial" => Ok(DeployStatus::SucceededPartial),
            "Failed" => Ok(DeployStatus::Failed),
            "Canceling" => Ok(DeployStatus::Canceling),
            "Canceled" => Ok(DeployStatus::Canceled),
            _ => Err(format!("Unknown deploy status: {}", s)),
        }
    }
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Result of a deployment.
#[derive(Debug, Clone)]
pub struct DeployResult {
    /// Async process ID.
    pub id: String,
    /// Whether the operation is complete.
    pub done: bool,
    /// Current status.
    pub status: DeployStatus,
    /// Whether the deployment succeeded.
    pub success: bool,
    /// Whether this was a validation-only deploy.
    pub check_only: bool,
    /// Error message if failed.
    pub error_message: Option<String>,
    /// Number of components deployed.
    pub number_components_deployed: u32,
    /// Number of components with errors.
    pub number_components_errors: u32,
    /// Total number of components.
    pub number_components_total: u32,
    /// Number of tests completed.
    pub number_tests_completed: u32,
    /// Number of tests with errors.
    pub number_tests_errors: u32,
    /// Total number of tests.
    pub number_tests_total: u32,
    pub created_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    /// Component failures.
    pub component_failures: Vec<ComponentFailure>,
    /// Component successes.
    pub component_successes: Vec<ComponentSuccess>,
    /// Test failures.
    pub test_failures: Vec<TestFailure>,
    /// State detail message.
    pub state_detail: Option<String>,
}

impl DeployResult {
    /// Keep a successful result, turn anything else into an error.
    pub fn into_success(self) -> Result<Self> {
        if self.done && self.success {
            return Ok(self);
        }

        let message = self
            .error_message
            .clone()
            .or_else(|| {
                self.component_failures
                    .first()
                    .map(|f| f.problem.clone())
            })
            .unwrap_or_else(|| format!("deploy {} ended with status {}", self.id, self.status));

        Err(Error::new(ErrorKind::DeploymentFailed {
            message,
            failures: self.component_failures,
        }))
    }
}

/// Result of canceling a deployment.
///
/// Cancellation is itself asynchronous: poll the deploy until it reaches
/// `Canceled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelDeployResult {
    /// The async process ID of the deployment being canceled.
    pub id: String,
    /// Whether the cancel operation has completed.
    pub done: bool,
}
