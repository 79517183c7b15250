//! `package:installed:list`.

use async_trait::async_trait;
use serde_json::Value;
use sfpkg_core::Result;
use sfpkg_core::sobjects::InstalledPackage;
use tracing::debug;

use super::CommandContext;
use super::handler::{CommandHandler, to_result};
use crate::cli::TargetOrgArgs;

const HEADERS: [&str; 7] = [
    "ID",
    "Package ID",
    "Package Name",
    "Namespace",
    "Package Version ID",
    "Version Name",
    "Version",
];

fn row(package: &InstalledPackage) -> Vec<String> {
    vec![
        package.id.clone(),
        package.subscriber_package_id.clone(),
        package.subscriber_package_name.clone(),
        package
            .subscriber_package_namespace
            .clone()
            .unwrap_or_default(),
        package.subscriber_package_version_id.clone(),
        package.subscriber_package_version_name.clone(),
        package.subscriber_package_version_number.clone(),
    ]
}

/// Handler for `package:installed:list`.
#[derive(Debug, Clone)]
pub struct InstalledListHandler {
    /// Target org selection
    pub org: TargetOrgArgs,
}

#[async_trait]
impl CommandHandler for InstalledListHandler {
    fn command_name(&self) -> &'static str {
        "package:installed:list"
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<Value> {
        let client = ctx.connect(&self.org)?;
        let packages = client.installed_packages().await?;
        debug!(count = packages.len(), "Fetched installed packages");

        let rows: Vec<Vec<String>> = packages.iter().map(row).collect();
        ctx.ux.table(&HEADERS, &rows);
        to_result(&packages)
    }
}
