//! `package:uninstall` and `package:uninstall:report`.

use async_trait::async_trait;
use serde_json::Value;
use sfpkg_core::{
    IdKind, LifecycleEvent, LifecycleEventKind, Result, resolve_subscriber_package_version_id,
    validate_id,
};
use std::time::Duration;
use tracing::info;

use super::CommandContext;
use super::handler::{CommandHandler, to_result};
use crate::cli::TargetOrgArgs;
use crate::messages;

/// Handler for `package:uninstall`.
#[derive(Debug, Clone)]
pub struct UninstallHandler {
    /// Package version ID or alias
    pub package: String,
    /// How long to poll before returning a pending request
    pub wait: Duration,
    /// Target org selection
    pub org: TargetOrgArgs,
}

#[async_trait]
impl CommandHandler for UninstallHandler {
    fn command_name(&self) -> &'static str {
        "package:uninstall"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<Value> {
        // Resolve before connecting so bad input never reaches the org
        let package_id = resolve_subscriber_package_version_id(&self.package, ctx.projects())?;
        let client = ctx.connect(&self.org)?;

        let ux = ctx.ux.clone();
        let _listener = ctx
            .lifecycle
            .on(LifecycleEventKind::PackageUninstall, move |event| {
                if let LifecycleEvent::PackageUninstall(request) = event {
                    ux.log(&messages::uninstall_waiting(request.status));
                }
            });

        info!(%package_id, wait_secs = self.wait.as_secs(), "Uninstalling package");
        let result = client.uninstall(&package_id, self.wait).await?;

        ctx.ux.log(&messages::uninstall_result(
            &result,
            &package_id,
            client.username(),
        ));
        to_result(&result)
    }
}

/// Handler for `package:uninstall:report`.
#[derive(Debug, Clone)]
pub struct UninstallReportHandler {
    /// Uninstall request ID (06y)
    pub request_id: String,
    /// Target org selection
    pub org: TargetOrgArgs,
}

#[async_trait]
impl CommandHandler for UninstallReportHandler {
    fn command_name(&self) -> &'static str {
        "package:uninstall:report"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<Value> {
        validate_id(&self.request_id, IdKind::PackageUninstallRequestId)?;
        let client = ctx.connect(&self.org)?;

        let result = client.uninstall_status(&self.request_id).await?;
        let package_id = result
            .subscriber_package_version_id()
            .unwrap_or_default()
            .to_string();
        ctx.ux.log(&messages::uninstall_result(
            &result,
            &package_id,
            client.username(),
        ));
        to_result(&result)
    }
}
