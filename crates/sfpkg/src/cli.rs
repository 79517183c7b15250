use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use sfpkg_core::{ApexCompileType, SecurityType, UpgradeType};
use std::ffi::OsString;
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Remote or runtime error exit code
pub const EXIT_RUNTIME: i32 = 1;
/// Usage, validation or configuration error exit code
pub const EXIT_CLI: i32 = 2;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Usage, validation or configuration error (exit code 2)
    #[error("{message}")]
    #[diagnostic(code(sfpkg::cli::config))]
    Config {
        /// Stable error name for JSON output
        name: &'static str,
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The org rejected or failed a request (exit code 1)
    #[error("{message}")]
    #[diagnostic(code(sfpkg::cli::remote))]
    Remote {
        /// Stable error name for JSON output
        name: &'static str,
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 1)
    #[error("{message}")]
    #[diagnostic(code(sfpkg::cli::other))]
    Other {
        /// Stable error name for JSON output
        name: &'static str,
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            name: "Error",
            message: message.into(),
            help: None,
        }
    }

    /// Stable error name reported in JSON output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config { name, .. } | Self::Remote { name, .. } | Self::Other { name, .. } => {
                *name
            }
        }
    }
}

/// Convert `sfpkg_core::Error` to appropriate `CliError` variant.
///
/// - Invalid input, project and configuration problems -> Config (exit code 2)
/// - Failed requests and transport problems -> Remote (exit code 1)
/// - I/O and other errors -> Other (exit code 1)
impl From<sfpkg_core::Error> for CliError {
    fn from(err: sfpkg_core::Error) -> Self {
        use sfpkg_core::Error;

        let name = err.name();
        match err {
            // Extract just the message to avoid "Configuration error: ..." twice
            Error::Configuration { message, help } => Self::Config {
                name,
                message,
                help,
            },
            Error::InvalidId { .. }
            | Error::ProjectNotFound { .. }
            | Error::PackageAliasNotFound { .. }
            | Error::ProjectParse { .. }
            | Error::NotImplemented { .. } => Self::Config {
                name,
                message: err.to_string(),
                help: None,
            },
            Error::Remote {
                status: Some(401), ..
            } => Self::Remote {
                name,
                message: err.to_string(),
                help: Some("The access token was rejected. Update it in config.toml or SFPKG_ACCESS_TOKEN".to_string()),
            },
            Error::PackageInstall { .. }
            | Error::PackageUninstall { .. }
            | Error::Remote { .. }
            | Error::Serialization { .. } => Self::Remote {
                name,
                message: err.to_string(),
                help: None,
            },
            Error::Io {
                source,
                path,
                operation,
            } => {
                let path_str = path
                    .as_ref()
                    .map_or(String::new(), |p| format!(" on {}", p.display()));
                Self::Other {
                    name,
                    message: format!("I/O {operation} failed{path_str}: {source}"),
                    help: Some("Check file permissions and ensure the path exists".to_string()),
                }
            }
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Remote { .. } | CliError::Other { .. } => EXIT_RUNTIME,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let envelope = ErrorEnvelope::new(exit_code_for(err), err.name(), err.to_string());
        let mut out = io::stdout().lock();
        match serde_json::to_string_pretty(&envelope) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(_) => {
                let _ = writeln!(io::stderr(), "Error serializing error response");
            }
        }
        let _ = out.flush();
    } else {
        // Use miette for human-friendly error display
        let report = Report::new(err.clone());
        let mut err_out = io::stderr().lock();
        let _ = writeln!(err_out, "{report:?}");
        let _ = err_out.flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Exit status, always 0 for success
    pub status: i32,
    /// The command's result
    pub result: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(result: T) -> Self {
        Self {
            status: EXIT_OK,
            result,
        }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The process exit code
    pub status: i32,
    /// Stable error name
    pub name: String,
    /// Human readable message
    pub message: String,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    #[must_use]
    pub fn new(status: i32, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Command line interface for Salesforce package lifecycle operations.
#[derive(Parser, Debug)]
#[command(name = "sfpkg")]
#[command(about = "Install, uninstall and report on Salesforce packages")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: crate::tracing::LogLevel,

    /// Diagnostic log format.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: crate::tracing::TracingFormat,

    /// Emit a JSON envelope instead of human readable output.
    #[arg(long, global = true, help = "Format output as JSON")]
    pub json: bool,
}

/// Org selection shared by commands that talk to an org.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetOrgArgs {
    /// Username or alias of the target org
    #[arg(short = 'u', long = "target-org", visible_alias = "targetusername")]
    pub target_org: Option<String>,
}

/// `package:uninstall`
#[derive(Args, Debug, Clone)]
pub struct UninstallArgs {
    /// ID (starts with 04t) or alias of the package version to uninstall
    #[arg(short = 'p', long)]
    pub package: String,

    /// Number of minutes to wait for uninstall status
    #[arg(short = 'w', long, default_value_t = 0)]
    pub wait: u64,

    #[command(flatten)]
    pub org: TargetOrgArgs,
}

/// `package:uninstall:report` and `package:install:report`
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// ID of the request to report on
    #[arg(short = 'i', long = "requestid")]
    pub request_id: String,

    #[command(flatten)]
    pub org: TargetOrgArgs,
}

/// `package:install`
#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// ID (starts with 04t) or alias of the package version to install
    #[arg(short = 'p', long)]
    pub package: String,

    /// Number of minutes to wait for installation status
    #[arg(short = 'w', long, default_value_t = 0)]
    pub wait: u64,

    /// Installation key for key-protected packages
    #[arg(short = 'k', long = "installationkey")]
    pub installation_key: Option<String>,

    /// Security access type for the installed package
    #[arg(short = 's', long = "securitytype", value_enum, default_value_t)]
    pub security_type: SecurityTypeArg,

    /// Upgrade type for the package installation
    #[arg(short = 't', long = "upgradetype", value_enum, default_value_t)]
    pub upgrade_type: UpgradeTypeArg,

    /// Compile all Apex in the org and package, or only Apex in the package
    #[arg(short = 'a', long = "apexcompile", value_enum, default_value_t)]
    pub apex_compile: ApexCompileArg,

    #[command(flatten)]
    pub org: TargetOrgArgs,
}

/// `package:installed:list`
#[derive(Args, Debug, Clone)]
pub struct InstalledListArgs {
    #[command(flatten)]
    pub org: TargetOrgArgs,
}

/// `package:version:list`
#[derive(Args, Debug, Clone)]
pub struct VersionListArgs {
    /// Created in the last specified number of days
    #[arg(short = 'c', long = "createdlastdays")]
    pub created_last_days: Option<u32>,

    /// Modified in the last specified number of days
    #[arg(short = 'm', long = "modifiedlastdays")]
    pub modified_last_days: Option<u32>,

    /// Comma-delimited list of package IDs or aliases
    #[arg(short = 'p', long, value_delimiter = ',')]
    pub packages: Vec<String>,

    /// Display released versions only
    #[arg(short = 'r', long)]
    pub released: bool,

    /// Comma-delimited list of fields to order by
    #[arg(short = 'o', long = "orderby", value_delimiter = ',')]
    pub order_by: Vec<String>,

    /// Display limited package version details
    #[arg(long)]
    pub concise: bool,

    /// Display extended package version details
    #[arg(long)]
    pub verbose: bool,

    /// Username or alias of the Dev Hub org
    #[arg(short = 'v', long = "target-dev-hub", visible_alias = "targetdevhubusername")]
    pub target_dev_hub: Option<String>,
}

/// `package1:version:create`
#[derive(Args, Debug, Clone)]
pub struct Package1VersionCreateArgs {
    /// ID of the metadata package (starts with 033)
    #[arg(short = 'i', long = "packageid")]
    pub package_id: String,

    /// Package version name
    #[arg(short = 'n', long)]
    pub name: String,

    /// Package version description
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Package version in major.minor format
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Create a managed package version
    #[arg(short = 'm', long = "managedreleased")]
    pub managed_released: bool,

    /// Release notes URL
    #[arg(short = 'r', long = "releasenotesurl")]
    pub release_notes_url: Option<String>,

    /// Post install URL
    #[arg(short = 'p', long = "postinstallurl")]
    pub post_install_url: Option<String>,

    /// Installation key for key-protected packages
    #[arg(short = 'k', long = "installationkey")]
    pub installation_key: Option<String>,

    /// Minutes to wait for the package version to be created
    #[arg(short = 'w', long)]
    pub wait: Option<u64>,

    #[command(flatten)]
    pub org: TargetOrgArgs,
}

/// `package1:version:list`
#[derive(Args, Debug, Clone)]
pub struct Package1VersionListArgs {
    /// Metadata package ID (starts with 033)
    #[arg(short = 'i', long = "packageid")]
    pub package_id: Option<String>,

    #[command(flatten)]
    pub org: TargetOrgArgs,
}

/// Available CLI subcommands.
///
/// Topics may also be given as separate words (`sfpkg package uninstall`);
/// see [`normalize_args`].
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a package in the target org
    #[command(name = "package:install")]
    PackageInstall(InstallArgs),

    /// Retrieve the status of a package installation request
    #[command(name = "package:install:report")]
    PackageInstallReport(ReportArgs),

    /// List the org's installed packages
    #[command(name = "package:installed:list")]
    PackageInstalledList(InstalledListArgs),

    /// Uninstall a second-generation package from the target org
    #[command(name = "package:uninstall")]
    PackageUninstall(UninstallArgs),

    /// Retrieve the status of a package uninstall request
    #[command(name = "package:uninstall:report")]
    PackageUninstallReport(ReportArgs),

    /// List all package versions in the Dev Hub org
    #[command(name = "package:version:list")]
    PackageVersionList(VersionListArgs),

    /// Create a first-generation package version in the release org
    #[command(name = "package1:version:create")]
    Package1VersionCreate(Package1VersionCreateArgs),

    /// List package versions for the specified first-generation package or org
    #[command(name = "package1:version:list")]
    Package1VersionList(Package1VersionListArgs),
}

/// Every command ID, colon-joined.
pub const COMMAND_IDS: &[&str] = &[
    "package:install",
    "package:install:report",
    "package:installed:list",
    "package:uninstall",
    "package:uninstall:report",
    "package:version:list",
    "package1:version:create",
    "package1:version:list",
];

impl Commands {
    /// The colon-joined command ID.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::PackageInstall(_) => "package:install",
            Self::PackageInstallReport(_) => "package:install:report",
            Self::PackageInstalledList(_) => "package:installed:list",
            Self::PackageUninstall(_) => "package:uninstall",
            Self::PackageUninstallReport(_) => "package:uninstall:report",
            Self::PackageVersionList(_) => "package:version:list",
            Self::Package1VersionCreate(_) => "package1:version:create",
            Self::Package1VersionList(_) => "package1:version:list",
        }
    }
}

/// Security access type accepted by `--securitytype`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SecurityTypeArg {
    /// All users in the org
    #[value(name = "AllUsers")]
    AllUsers,
    /// Administrators only
    #[default]
    #[value(name = "AdminsOnly")]
    AdminsOnly,
}

impl From<SecurityTypeArg> for SecurityType {
    fn from(arg: SecurityTypeArg) -> Self {
        match arg {
            SecurityTypeArg::AllUsers => Self::AllUsers,
            SecurityTypeArg::AdminsOnly => Self::AdminsOnly,
        }
    }
}

/// Upgrade type accepted by `--upgradetype`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UpgradeTypeArg {
    /// Mark removed components deprecated
    #[value(name = "DeprecateOnly")]
    DeprecateOnly,
    /// Delete what can be deleted, deprecate the rest
    #[default]
    #[value(name = "Mixed")]
    Mixed,
    /// Delete removed components
    #[value(name = "Delete")]
    Delete,
}

impl From<UpgradeTypeArg> for UpgradeType {
    fn from(arg: UpgradeTypeArg) -> Self {
        match arg {
            UpgradeTypeArg::DeprecateOnly => Self::DeprecateOnly,
            UpgradeTypeArg::Mixed => Self::Mixed,
            UpgradeTypeArg::Delete => Self::Delete,
        }
    }
}

/// Apex compile scope accepted by `--apexcompile`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ApexCompileArg {
    /// All Apex in the org and package
    #[default]
    All,
    /// Only Apex in the package
    Package,
}

impl From<ApexCompileArg> for ApexCompileType {
    fn from(arg: ApexCompileArg) -> Self {
        match arg {
            ApexCompileArg::All => Self::All,
            ApexCompileArg::Package => Self::Package,
        }
    }
}

/// Convert a `--wait` value in minutes.
#[must_use]
pub const fn wait_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Global flags that take a separate value.
const GLOBAL_VALUE_FLAGS: &[&str] = &["-L", "--level", "--log-format"];

/// Join space separated topics into a command ID.
///
/// `sfpkg --json package uninstall report -i 06y...` becomes
/// `sfpkg --json package:uninstall:report -i 06y...`. The longest run of
/// leading words that names a command wins; anything else is left untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    let mut start = 1;
    while let Some(arg) = args.get(start).and_then(|a| a.to_str()) {
        if !arg.starts_with('-') {
            break;
        }
        start += if GLOBAL_VALUE_FLAGS.contains(&arg) { 2 } else { 1 };
    }

    let words: Vec<String> = args
        .iter()
        .skip(start)
        .map_while(|a| a.to_str())
        .take_while(|w| !w.starts_with('-') && !w.contains(':'))
        .map(str::to_string)
        .collect();

    for len in (2..=words.len()).rev() {
        let id = words[..len].join(":");
        if COMMAND_IDS.contains(&id.as_str()) {
            args.drain(start..start + len);
            args.insert(start, OsString::from(id));
            break;
        }
    }
    args
}

/// Parse arguments from the process environment.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse_from(normalize_args(std::env::args_os()))
}

/// Parse arguments from an iterator, joining topics first.
pub fn try_parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    Cli::try_parse_from(normalize_args(args))
}
