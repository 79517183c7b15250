//! The packaging client boundary.
//!
//! Commands never talk to an org directly. They call a [`PackagingClient`],
//! which owns request creation, polling within the `wait` budget and error
//! collection. `sfpkg-tooling` provides the REST implementation.

use crate::Result;
use crate::sobjects::{
    InstalledPackage, PackageInstallRequest, SubscriberPackageVersionUninstallRequest,
};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Who can use the installed package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    /// All users in the org
    AllUsers,
    /// Administrators only
    #[default]
    AdminsOnly,
}

impl SecurityType {
    /// Value sent as `SecurityType` on the install request.
    #[must_use]
    pub const fn wire_value(self) -> &'static str {
        match self {
            Self::AllUsers => "Full",
            Self::AdminsOnly => "None",
        }
    }
}

/// What happens to components removed in an upgrade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeType {
    /// Mark removed components deprecated
    DeprecateOnly,
    /// Delete what can be deleted, deprecate the rest
    #[default]
    Mixed,
    /// Delete removed components
    Delete,
}

impl UpgradeType {
    /// Value sent as `UpgradeType` on the install request.
    #[must_use]
    pub const fn wire_value(self) -> &'static str {
        match self {
            Self::DeprecateOnly => "deprecate-only",
            Self::Mixed => "mixed-mode",
            Self::Delete => "delete-only",
        }
    }
}

/// Which Apex gets compiled after install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApexCompileType {
    /// All Apex in the org
    #[default]
    All,
    /// Only the package's Apex
    Package,
}

impl ApexCompileType {
    /// Value sent as `ApexCompileType` on the install request.
    #[must_use]
    pub const fn wire_value(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Package => "package",
        }
    }
}

/// Parameters for a package install.
#[derive(Clone, Default)]
pub struct InstallOptions {
    /// Package version to install (04t)
    pub subscriber_package_version_key: String,
    /// Installation key for protected packages
    pub installation_key: Option<SecretString>,
    /// Who gets access to the package
    pub security_type: SecurityType,
    /// Handling of metadata removed in an upgrade
    pub upgrade_type: UpgradeType,
    /// Apex compilation scope
    pub apex_compile_type: ApexCompileType,
}

impl InstallOptions {
    /// Options with defaults for the given package version.
    #[must_use]
    pub fn new(subscriber_package_version_key: impl Into<String>) -> Self {
        Self {
            subscriber_package_version_key: subscriber_package_version_key.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for InstallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallOptions")
            .field(
                "subscriber_package_version_key",
                &self.subscriber_package_version_key,
            )
            .field(
                "installation_key",
                &self.installation_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("security_type", &self.security_type)
            .field("upgrade_type", &self.upgrade_type)
            .field("apex_compile_type", &self.apex_compile_type)
            .finish()
    }
}

/// Operations the package commands need from an org.
///
/// `wait` is a polling budget: implementations return as soon as the request
/// leaves its pending state, or with the last observed record once `wait`
/// has elapsed. A zero `wait` returns the freshly created request.
#[async_trait]
pub trait PackagingClient: Send + Sync {
    /// Username of the connection, shown in follow-up hints.
    fn username(&self) -> &str;

    /// Start uninstalling a package version.
    async fn uninstall(
        &self,
        subscriber_package_version_id: &str,
        wait: Duration,
    ) -> Result<SubscriberPackageVersionUninstallRequest>;

    /// Fetch an uninstall request.
    async fn uninstall_status(&self, request_id: &str)
    -> Result<SubscriberPackageVersionUninstallRequest>;

    /// Start installing a package version.
    async fn install(&self, options: &InstallOptions, wait: Duration)
    -> Result<PackageInstallRequest>;

    /// Fetch an install request.
    async fn install_status(&self, request_id: &str) -> Result<PackageInstallRequest>;

    /// List packages installed in the org.
    async fn installed_packages(&self) -> Result<Vec<InstalledPackage>>;
}
