//! Command implementations.

pub mod handler;
pub mod install;
pub mod installed;
pub mod stubs;
pub mod uninstall;

use crate::cli::{Commands, TargetOrgArgs, wait_minutes};
use crate::output::Ux;
use secrecy::SecretString;
use serde_json::Value;
use sfpkg_core::config::Config;
use sfpkg_core::resolve::DiscoverProject;
use sfpkg_core::{Lifecycle, PackagingClient, ProjectSource, Result, SfProject};
use sfpkg_tooling::ToolingClient;
use std::sync::Arc;
use tracing::debug;

pub use handler::{CommandHandler, CommandRunner};

/// Opens a [`PackagingClient`] for an org.
pub trait Connector: Send + Sync {
    /// Connect to `target_org`, or the default org when `None`.
    ///
    /// The client emits progress on `lifecycle`.
    fn connect(
        &self,
        target_org: Option<&str>,
        lifecycle: &Lifecycle,
    ) -> Result<Arc<dyn PackagingClient>>;
}

/// Connects through the Tooling REST API using the user configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolingConnector;

impl Connector for ToolingConnector {
    fn connect(
        &self,
        target_org: Option<&str>,
        lifecycle: &Lifecycle,
    ) -> Result<Arc<dyn PackagingClient>> {
        let config = Config::load_default()?;
        let connection = config.resolve_connection(target_org)?;
        debug!(
            username = %connection.username,
            instance_url = %connection.instance_url,
            "Connecting to org"
        );
        let client = ToolingClient::new(connection, lifecycle.clone())?
            .with_poll_interval(config.poll_interval());
        Ok(Arc::new(client))
    }
}

/// Hands out the same client for every org.
#[derive(Clone)]
pub struct StaticConnector(pub Arc<dyn PackagingClient>);

impl Connector for StaticConnector {
    fn connect(&self, _: Option<&str>, _: &Lifecycle) -> Result<Arc<dyn PackagingClient>> {
        Ok(Arc::clone(&self.0))
    }
}

/// Everything a command needs besides its arguments.
pub struct CommandContext {
    /// Output sink
    pub ux: Ux,
    /// Progress notifications
    pub lifecycle: Lifecycle,
    projects: Arc<dyn ProjectSource + Send + Sync>,
    connector: Arc<dyn Connector>,
}

impl CommandContext {
    /// Build a context from its parts.
    pub fn new(
        ux: Ux,
        lifecycle: Lifecycle,
        projects: Arc<dyn ProjectSource + Send + Sync>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            ux,
            lifecycle,
            projects,
            connector,
        }
    }

    /// The production context: stdout, the project around the working
    /// directory and Tooling API connections.
    #[must_use]
    pub fn production(json: bool) -> Self {
        let projects = || -> Result<SfProject> { DiscoverProject::from_current_dir()?.load_project() };
        Self::new(
            Ux::stdout(json),
            Lifecycle::new(),
            Arc::new(projects),
            Arc::new(ToolingConnector),
        )
    }

    /// Project used for alias resolution.
    pub fn projects(&self) -> &(dyn ProjectSource + Send + Sync) {
        self.projects.as_ref()
    }

    /// Connect to the org selected by `org`.
    pub fn connect(&self, org: &TargetOrgArgs) -> Result<Arc<dyn PackagingClient>> {
        self.connector
            .connect(org.target_org.as_deref(), &self.lifecycle)
    }
}

impl Commands {
    /// Build the handler for this command.
    #[must_use]
    pub fn into_handler(self) -> Box<dyn CommandHandler> {
        match self {
            Self::PackageInstall(args) => Box::new(install::InstallHandler {
                package: args.package,
                wait: wait_minutes(args.wait),
                installation_key: args.installation_key.map(SecretString::from),
                security_type: args.security_type.into(),
                upgrade_type: args.upgrade_type.into(),
                apex_compile_type: args.apex_compile.into(),
                org: args.org,
            }),
            Self::PackageInstallReport(args) => Box::new(install::InstallReportHandler {
                request_id: args.request_id,
                org: args.org,
            }),
            Self::PackageInstalledList(args) => {
                Box::new(installed::InstalledListHandler { org: args.org })
            }
            Self::PackageUninstall(args) => Box::new(uninstall::UninstallHandler {
                package: args.package,
                wait: wait_minutes(args.wait),
                org: args.org,
            }),
            Self::PackageUninstallReport(args) => Box::new(uninstall::UninstallReportHandler {
                request_id: args.request_id,
                org: args.org,
            }),
            Self::PackageVersionList(_) => Box::new(stubs::NotImplementedHandler {
                command: "package:version:list",
            }),
            Self::Package1VersionCreate(_) => Box::new(stubs::NotImplementedHandler {
                command: "package1:version:create",
            }),
            Self::Package1VersionList(_) => Box::new(stubs::NotImplementedHandler {
                command: "package1:version:list",
            }),
        }
    }
}

/// Run a parsed command.
pub async fn execute(ctx: &CommandContext, command: Commands) -> Result<Value> {
    let handler = command.into_handler();
    ctx.run_command(handler.as_ref()).await
}
