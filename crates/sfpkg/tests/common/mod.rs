//! Shared setup for the command tests.

#![allow(dead_code)]

use serde_json::json;
use sfpkg::cli::try_parse_from;
use sfpkg::commands::{CommandContext, StaticConnector, execute};
use sfpkg::output::{Captured, Ux};
use sfpkg_core::project::ProjectJson;
use sfpkg_core::test_utils::{FakePackagingClient, PACKAGE_VERSION_ID};
use sfpkg_core::{Error, Lifecycle, ProjectSource, Result, SfProject};
use std::sync::Arc;

pub const USERNAME: &str = "test@user.com";

/// A project whose `MyPkg@1.0.0-1` alias points at [`PACKAGE_VERSION_ID`].
pub fn project() -> Arc<dyn ProjectSource + Send + Sync> {
    let json: ProjectJson = serde_json::from_value(json!({
        "packageDirectories": [{ "path": "force-app", "default": true, "package": "MyPkg" }],
        "packageAliases": {
            "MyPkg": "0Ho6A000000kA1ASAU",
            "MyPkg@1.0.0-1": PACKAGE_VERSION_ID,
            "Broken@1.0.0-1": "04tNOTANID"
        }
    }))
    .unwrap();
    Arc::new(SfProject::new("/project", json))
}

/// No project around the working directory.
pub fn no_project() -> Arc<dyn ProjectSource + Send + Sync> {
    Arc::new(|| -> Result<SfProject> { Err(Error::configuration("no sfdx-project.json")) })
}

pub struct Harness {
    pub ctx: CommandContext,
    pub client: Arc<FakePackagingClient>,
    pub output: Captured,
}

impl Harness {
    pub fn new(json: bool, projects: Arc<dyn ProjectSource + Send + Sync>) -> Self {
        let lifecycle = Lifecycle::new();
        let client =
            Arc::new(FakePackagingClient::new(USERNAME).with_lifecycle(lifecycle.clone()));
        let (ux, output) = Ux::capture(json);
        let ctx = CommandContext::new(
            ux,
            lifecycle,
            projects,
            Arc::new(StaticConnector(client.clone())),
        );
        Self {
            ctx,
            client,
            output,
        }
    }

    /// Parse `args` (without the binary name) and run the command.
    pub async fn run(&self, args: &[&str]) -> Result<serde_json::Value> {
        let cli = try_parse_from(std::iter::once("sfpkg").chain(args.iter().copied())).unwrap();
        execute(&self.ctx, cli.command).await
    }

    pub fn lines(&self) -> Vec<String> {
        self.output.lines()
    }
}
