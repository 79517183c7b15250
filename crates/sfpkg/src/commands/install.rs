//! `package:install` and `package:install:report`.

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use sfpkg_core::sobjects::{InstallStatus, PackageInstallRequest};
use sfpkg_core::{
    ApexCompileType, IdKind, InstallOptions, LifecycleEvent, LifecycleEventKind, Result,
    SecurityType, UpgradeType, resolve_subscriber_package_version_id, validate_id,
};
use std::time::Duration;
use tracing::{info, warn};

use super::CommandContext;
use super::handler::{CommandHandler, to_result};
use crate::cli::TargetOrgArgs;
use crate::messages;

/// Handler for `package:install`.
#[derive(Debug, Clone)]
pub struct InstallHandler {
    /// Package version ID or alias
    pub package: String,
    /// How long to poll before returning a pending request
    pub wait: Duration,
    /// Key for protected packages
    pub installation_key: Option<SecretString>,
    /// Who gets access to the package
    pub security_type: SecurityType,
    /// Handling of metadata removed in an upgrade
    pub upgrade_type: UpgradeType,
    /// Apex compilation scope
    pub apex_compile_type: ApexCompileType,
    /// Target org selection
    pub org: TargetOrgArgs,
}

/// Clients are not required to fail on `ERROR` themselves.
fn ensure_installed(record: PackageInstallRequest) -> Result<PackageInstallRequest> {
    if record.status == InstallStatus::Error {
        warn!(request_id = %record.id, "Install request failed");
    }
    record.into_result()
}

#[async_trait]
impl CommandHandler for InstallHandler {
    fn command_name(&self) -> &'static str {
        "package:install"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<Value> {
        let package_id = resolve_subscriber_package_version_id(&self.package, ctx.projects())?;
        let client = ctx.connect(&self.org)?;

        let ux = ctx.ux.clone();
        let _listener = ctx
            .lifecycle
            .on(LifecycleEventKind::PackageInstall, move |event| {
                if let LifecycleEvent::PackageInstall(request) = event {
                    ux.log(&messages::install_waiting(request.status));
                }
            });

        let options = InstallOptions {
            subscriber_package_version_key: package_id.clone(),
            installation_key: self.installation_key.clone(),
            security_type: self.security_type,
            upgrade_type: self.upgrade_type,
            apex_compile_type: self.apex_compile_type,
        };
        info!(%package_id, wait_secs = self.wait.as_secs(), "Installing package");
        let result = ensure_installed(client.install(&options, self.wait).await?)?;

        ctx.ux.log(&messages::install_result(
            &result,
            &package_id,
            client.username(),
        ));
        to_result(&result)
    }
}

/// Handler for `package:install:report`.
#[derive(Debug, Clone)]
pub struct InstallReportHandler {
    /// Install request ID (0Hf)
    pub request_id: String,
    /// Target org selection
    pub org: TargetOrgArgs,
}

#[async_trait]
impl CommandHandler for InstallReportHandler {
    fn command_name(&self) -> &'static str {
        "package:install:report"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<Value> {
        validate_id(&self.request_id, IdKind::PackageInstallRequestId)?;
        let client = ctx.connect(&self.org)?;

        let result = ensure_installed(client.install_status(&self.request_id).await?)?;
        let package_id = result
            .subscriber_package_version_key()
            .unwrap_or_default()
            .to_string();
        ctx.ux.log(&messages::install_result(
            &result,
            &package_id,
            client.username(),
        ));
        to_result(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sfpkg_core::Error;
    use sfpkg_core::test_utils::install_request;

    #[test]
    fn test_ensure_installed_passes_through() {
        let record = install_request(InstallStatus::InProgress);
        assert_eq!(ensure_installed(record.clone()).unwrap(), record);
    }

    #[test]
    fn test_ensure_installed_collects_errors() {
        let mut record = install_request(InstallStatus::Error);
        record.extra.insert(
            "Errors".to_string(),
            json!({ "errors": [{ "message": "first" }, { "message": "second" }] }),
        );
        match ensure_installed(record) {
            Err(Error::PackageInstall { messages }) => assert_eq!(messages, ["first", "second"]),
            other => panic!("expected PackageInstall, got {other:?}"),
        }
    }
}
