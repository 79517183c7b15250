//! Install and uninstall request records.
//!
//! Records are returned to the user unmodified in `--json` mode, so only the
//! fields the commands read are typed. Everything else rides along in
//! `extra` and is serialized back in place.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status of a `SubscriberPackageVersionUninstallRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UninstallStatus {
    /// Accepted but not started
    Queued,
    /// Being processed by the org
    InProgress,
    /// Package removed
    Success,
    /// Uninstall failed; errors are recorded on the org
    Error,
}

impl UninstallStatus {
    /// Whether the org is still working on the request.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Queued | Self::InProgress)
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::InProgress => "InProgress",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for UninstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a `PackageInstallRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallStatus {
    /// Being processed by the org
    InProgress,
    /// Package installed
    Success,
    /// Install failed; see `Errors`
    Error,
    /// Status not known
    Unknown,
}

impl InstallStatus {
    /// Whether the org is still working on the request.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::InProgress | Self::Unknown)
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `SubscriberPackageVersionUninstallRequest` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriberPackageVersionUninstallRequest {
    /// Request ID (06y)
    pub id: String,
    /// Request status
    pub status: UninstallStatus,
    /// Remaining fields (`SubscriberPackageVersionId`, `attributes`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubscriberPackageVersionUninstallRequest {
    /// The package version being removed (04t), if the org reported one.
    #[must_use]
    pub fn subscriber_package_version_id(&self) -> Option<&str> {
        self.extra
            .get("SubscriberPackageVersionId")
            .and_then(Value::as_str)
    }
}

/// `PackageInstallRequest` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInstallRequest {
    /// Request ID (0Hf)
    pub id: String,
    /// Request status
    pub status: InstallStatus,
    /// Remaining fields (`SubscriberPackageVersionKey`, `Errors`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageInstallRequest {
    /// The package version being installed (04t), if the org reported one.
    #[must_use]
    pub fn subscriber_package_version_key(&self) -> Option<&str> {
        self.extra
            .get("SubscriberPackageVersionKey")
            .and_then(Value::as_str)
    }

    /// Messages from the `Errors.errors` list, in order.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        self.extra
            .get("Errors")
            .and_then(|errors| errors.get("errors"))
            .and_then(Value::as_array)
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fail with [`Error::PackageInstall`] if the request is in `ERROR`.
    ///
    /// # Errors
    ///
    /// Returns the request's error messages when its status is `ERROR`.
    pub fn into_result(self) -> Result<Self> {
        if self.status == InstallStatus::Error {
            return Err(Error::PackageInstall {
                messages: self.error_messages(),
            });
        }
        Ok(self)
    }
}

/// A package installed in the target org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstalledPackage {
    /// `InstalledSubscriberPackage` ID (0A3)
    pub id: String,
    /// Package ID (033)
    pub subscriber_package_id: String,
    /// Package name
    pub subscriber_package_name: String,
    /// Namespace prefix, for managed packages
    pub subscriber_package_namespace: Option<String>,
    /// Package version ID (04t)
    pub subscriber_package_version_id: String,
    /// Version name
    pub subscriber_package_version_name: String,
    /// `major.minor.patch.build`
    pub subscriber_package_version_number: String,
}
