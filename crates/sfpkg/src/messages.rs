//! Status lines printed by the package commands.

use sfpkg_core::sobjects::{
    InstallStatus, PackageInstallRequest, SubscriberPackageVersionUninstallRequest,
    UninstallStatus,
};

/// Printed for each pending uninstall observed while waiting.
#[must_use]
pub fn uninstall_waiting(status: UninstallStatus) -> String {
    format!("Waiting for the package uninstall request to get processed. Status = {status}")
}

/// Printed for each pending install observed while waiting.
#[must_use]
pub fn install_waiting(status: InstallStatus) -> String {
    format!("Waiting for the package install request to complete. Status = {status}")
}

/// Final line for an uninstall request.
///
/// `package_id` is used when the record does not name its package version.
#[must_use]
pub fn uninstall_result(
    record: &SubscriberPackageVersionUninstallRequest,
    package_id: &str,
    username: &str,
) -> String {
    match record.status {
        UninstallStatus::Success => format!(
            "Successfully uninstalled package [{}]",
            record.subscriber_package_version_id().unwrap_or(package_id)
        ),
        status => format!(
            "PackageUninstallRequest is currently {status}. You can continue to query the status using\n\
             sfpkg package:uninstall:report -i {} -u {username}",
            record.id
        ),
    }
}

/// Final line for an install request.
#[must_use]
pub fn install_result(record: &PackageInstallRequest, package_id: &str, username: &str) -> String {
    match record.status {
        InstallStatus::Success => format!(
            "Successfully installed package [{}]",
            record.subscriber_package_version_key().unwrap_or(package_id)
        ),
        _ => format!(
            "PackageInstallRequest is currently InProgress. You can continue to query the status using\n\
             sfpkg package:install:report -i {} -u {username}",
            record.id
        ),
    }
}
