//! Shared test utilities for sfpkg tests.
//!
//! [`FakePackagingClient`] stands in for an org: responses are queued per
//! operation and every call is recorded for later assertions.

use crate::client::{ApexCompileType, InstallOptions, PackagingClient, SecurityType, UpgradeType};
use crate::lifecycle::{Lifecycle, LifecycleEvent};
use crate::sobjects::{
    InstallStatus, InstalledPackage, PackageInstallRequest,
    SubscriberPackageVersionUninstallRequest, UninstallStatus,
};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Uninstall request ID used by the fixtures.
pub const UNINSTALL_REQUEST_ID: &str = "06y000000000001AAA";
/// Install request ID used by the fixtures.
pub const INSTALL_REQUEST_ID: &str = "0Hf1h0000006sh2CAA";
/// Package version ID used by the fixtures.
pub const PACKAGE_VERSION_ID: &str = "04t6A000002zgKSQAY";

/// A call made against a [`FakePackagingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    /// [`PackagingClient::uninstall`]
    Uninstall {
        /// Version passed in
        subscriber_package_version_id: String,
        /// Wait passed in
        wait: Duration,
    },
    /// [`PackagingClient::uninstall_status`]
    UninstallStatus {
        /// Request ID passed in
        request_id: String,
    },
    /// [`PackagingClient::install`]
    Install {
        /// Version passed in
        subscriber_package_version_key: String,
        /// Wait passed in
        wait: Duration,
        /// Whether an installation key was given
        has_installation_key: bool,
        /// Security type passed in
        security_type: SecurityType,
        /// Upgrade type passed in
        upgrade_type: UpgradeType,
        /// Apex compile type passed in
        apex_compile_type: ApexCompileType,
    },
    /// [`PackagingClient::install_status`]
    InstallStatus {
        /// Request ID passed in
        request_id: String,
    },
    /// [`PackagingClient::installed_packages`]
    InstalledPackages,
}

#[derive(Default)]
struct FakeState {
    uninstall: VecDeque<Result<SubscriberPackageVersionUninstallRequest>>,
    uninstall_progress: Vec<SubscriberPackageVersionUninstallRequest>,
    uninstall_status: VecDeque<Result<SubscriberPackageVersionUninstallRequest>>,
    install: VecDeque<Result<PackageInstallRequest>>,
    install_progress: Vec<PackageInstallRequest>,
    install_status: VecDeque<Result<PackageInstallRequest>>,
    installed: VecDeque<Result<Vec<InstalledPackage>>>,
    calls: Vec<FakeCall>,
}

/// In-memory [`PackagingClient`].
///
/// Progress records queued with `push_*_progress` are emitted on the
/// lifecycle before the final response, the way a polling client would, but
/// only when the call has a non-zero `wait`.
pub struct FakePackagingClient {
    username: String,
    lifecycle: Option<Lifecycle>,
    state: Mutex<FakeState>,
}

impl FakePackagingClient {
    /// A client with no queued responses.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            lifecycle: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Emit progress events on `lifecycle`.
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the result of the next `uninstall` call.
    pub fn push_uninstall(&self, response: Result<SubscriberPackageVersionUninstallRequest>) {
        self.state().uninstall.push_back(response);
    }

    /// Emit `record` as progress during the next `uninstall` call with a non-zero wait.
    pub fn push_uninstall_progress(&self, record: SubscriberPackageVersionUninstallRequest) {
        self.state().uninstall_progress.push(record);
    }

    /// Queue the result of the next `uninstall_status` call.
    pub fn push_uninstall_status(&self, response: Result<SubscriberPackageVersionUninstallRequest>) {
        self.state().uninstall_status.push_back(response);
    }

    /// Queue the result of the next `install` call.
    pub fn push_install(&self, response: Result<PackageInstallRequest>) {
        self.state().install.push_back(response);
    }

    /// Emit `record` as progress during the next `install` call with a non-zero wait.
    pub fn push_install_progress(&self, record: PackageInstallRequest) {
        self.state().install_progress.push(record);
    }

    /// Queue the result of the next `install_status` call.
    pub fn push_install_status(&self, response: Result<PackageInstallRequest>) {
        self.state().install_status.push_back(response);
    }

    /// Queue the result of the next `installed_packages` call.
    pub fn push_installed(&self, response: Result<Vec<InstalledPackage>>) {
        self.state().installed.push_back(response);
    }

    /// Calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state().calls.clone()
    }

    fn emit_all(&self, events: Vec<LifecycleEvent>) {
        if let Some(lifecycle) = &self.lifecycle {
            for event in &events {
                lifecycle.emit(event);
            }
        }
    }
}

fn nothing_queued(operation: &str) -> Error {
    Error::remote(None, format!("no response queued for {operation}"))
}

#[async_trait]
impl PackagingClient for FakePackagingClient {
    fn username(&self) -> &str {
        &self.username
    }

    async fn uninstall(
        &self,
        subscriber_package_version_id: &str,
        wait: Duration,
    ) -> Result<SubscriberPackageVersionUninstallRequest> {
        let (events, response) = {
            let mut state = self.state();
            state.calls.push(FakeCall::Uninstall {
                subscriber_package_version_id: subscriber_package_version_id.to_string(),
                wait,
            });
            let events: Vec<_> = if wait.is_zero() {
                Vec::new()
            } else {
                state
                    .uninstall_progress
                    .drain(..)
                    .map(LifecycleEvent::PackageUninstall)
                    .collect()
            };
            (events, state.uninstall.pop_front())
        };
        self.emit_all(events);
        response.unwrap_or_else(|| Err(nothing_queued("uninstall")))
    }

    async fn uninstall_status(
        &self,
        request_id: &str,
    ) -> Result<SubscriberPackageVersionUninstallRequest> {
        let mut state = self.state();
        state.calls.push(FakeCall::UninstallStatus {
            request_id: request_id.to_string(),
        });
        state
            .uninstall_status
            .pop_front()
            .unwrap_or_else(|| Err(nothing_queued("uninstall_status")))
    }

    async fn install(
        &self,
        options: &InstallOptions,
        wait: Duration,
    ) -> Result<PackageInstallRequest> {
        let (events, response) = {
            let mut state = self.state();
            state.calls.push(FakeCall::Install {
                subscriber_package_version_key: options.subscriber_package_version_key.clone(),
                wait,
                has_installation_key: options.installation_key.is_some(),
                security_type: options.security_type,
                upgrade_type: options.upgrade_type,
                apex_compile_type: options.apex_compile_type,
            });
            let events: Vec<_> = if wait.is_zero() {
                Vec::new()
            } else {
                state
                    .install_progress
                    .drain(..)
                    .map(LifecycleEvent::PackageInstall)
                    .collect()
            };
            (events, state.install.pop_front())
        };
        self.emit_all(events);
        response.unwrap_or_else(|| Err(nothing_queued("install")))
    }

    async fn install_status(&self, request_id: &str) -> Result<PackageInstallRequest> {
        let mut state = self.state();
        state.calls.push(FakeCall::InstallStatus {
            request_id: request_id.to_string(),
        });
        state
            .install_status
            .pop_front()
            .unwrap_or_else(|| Err(nothing_queued("install_status")))
    }

    async fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        let mut state = self.state();
        state.calls.push(FakeCall::InstalledPackages);
        state
            .installed
            .pop_front()
            .unwrap_or_else(|| Err(nothing_queued("installed_packages")))
    }
}

/// An uninstall request for [`PACKAGE_VERSION_ID`] in `status`.
#[must_use]
pub fn uninstall_request(status: UninstallStatus) -> SubscriberPackageVersionUninstallRequest {
    let mut extra = Map::new();
    extra.insert(
        "attributes".to_string(),
        json!({ "type": "SubscriberPackageVersionUninstallRequest" }),
    );
    extra.insert("IsDeleted".to_string(), Value::Bool(false));
    extra.insert(
        "SubscriberPackageVersionId".to_string(),
        json!(PACKAGE_VERSION_ID),
    );
    SubscriberPackageVersionUninstallRequest {
        id: UNINSTALL_REQUEST_ID.to_string(),
        status,
        extra,
    }
}

/// An install request for [`PACKAGE_VERSION_ID`] in `status`.
#[must_use]
pub fn install_request(status: InstallStatus) -> PackageInstallRequest {
    let mut extra = Map::new();
    extra.insert(
        "attributes".to_string(),
        json!({ "type": "PackageInstallRequest" }),
    );
    extra.insert("SecurityType".to_string(), json!("None"));
    extra.insert("Errors".to_string(), Value::Null);
    extra.insert(
        "SubscriberPackageVersionKey".to_string(),
        json!(PACKAGE_VERSION_ID),
    );
    PackageInstallRequest {
        id: INSTALL_REQUEST_ID.to_string(),
        status,
        extra,
    }
}

/// An installed package row.
#[must_use]
pub fn installed_package(name: &str, namespace: Option<&str>, version: &str) -> InstalledPackage {
    InstalledPackage {
        id: "0A31h000000XY1aCAG".to_string(),
        subscriber_package_id: "0331h000000CpfKAAS".to_string(),
        subscriber_package_name: name.to_string(),
        subscriber_package_namespace: namespace.map(str::to_string),
        subscriber_package_version_id: PACKAGE_VERSION_ID.to_string(),
        subscriber_package_version_name: format!("{name} {version}"),
        subscriber_package_version_number: version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleEventKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fake_emits_progress_then_returns() {
        let lifecycle = Lifecycle::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _guard = lifecycle.on(LifecycleEventKind::PackageUninstall, move |event| {
            if let LifecycleEvent::PackageUninstall(r) = event {
                sink.lock().unwrap().push(r.status);
            }
        });

        let client = FakePackagingClient::new("test@user.com").with_lifecycle(lifecycle);
        client.push_uninstall_progress(uninstall_request(UninstallStatus::Queued));
        client.push_uninstall(Ok(uninstall_request(UninstallStatus::Success)));

        let result = client
            .uninstall(PACKAGE_VERSION_ID, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(result.status, UninstallStatus::Success);
        assert_eq!(*seen.lock().unwrap(), vec![UninstallStatus::Queued]);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fake_without_response_fails() {
        let client = FakePackagingClient::new("test@user.com");
        assert!(client.installed_packages().await.is_err());
        assert_eq!(client.calls(), vec![FakeCall::InstalledPackages]);
    }

    #[test]
    fn test_fixture_ids_are_valid() {
        use crate::ids::{IdKind, validate_id};
        validate_id(UNINSTALL_REQUEST_ID, IdKind::PackageUninstallRequestId).unwrap();
        validate_id(INSTALL_REQUEST_ID, IdKind::PackageInstallRequestId).unwrap();
        validate_id(PACKAGE_VERSION_ID, IdKind::SubscriberPackageVersionId).unwrap();
    }
}
