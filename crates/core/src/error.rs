//! Error types for sfpkg

use crate::ids::IdKind;
use miette::Diagnostic;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for sfpkg operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A record ID failed format validation
    #[error(
        "The {kind}: [{id}] is invalid. It must start with \"{}\" and be a valid 15 or 18 character record ID.",
        .kind.prefix()
    )]
    #[diagnostic(code(sfpkg::id::invalid))]
    InvalidId {
        /// The rejected ID
        id: String,
        /// The kind of ID that was expected
        kind: IdKind,
    },

    /// Alias resolution needed a project that could not be loaded
    #[error(
        "Couldn't find a sfdx-project.json to resolve the package alias [{token}]. Run this command from within a project or use a 04t package version ID."
    )]
    #[diagnostic(code(sfpkg::project::not_found))]
    ProjectNotFound {
        /// The alias that was being resolved
        token: String,
    },

    /// The project has no `packageAliases` entry for the alias
    #[error(
        "The package alias [{alias}] isn't defined in the packageAliases section of sfdx-project.json. Add it or use a 04t package version ID."
    )]
    #[diagnostic(code(sfpkg::project::alias_not_found))]
    PackageAliasNotFound {
        /// The alias that was not found
        alias: String,
    },

    /// `sfdx-project.json` exists but could not be parsed
    #[error("Invalid project file {}: {message}", path.display())]
    #[diagnostic(code(sfpkg::project::parse))]
    ProjectParse {
        /// Path of the project file
        path: Box<Path>,
        /// Parser message
        message: String,
    },

    /// An install request ended in the `ERROR` status
    #[error("{}", install_error_message(.messages))]
    #[diagnostic(code(sfpkg::install::failed))]
    PackageInstall {
        /// One entry per error reported by the org
        messages: Vec<String>,
    },

    /// An uninstall request ended in the `Error` status
    #[error("{}", uninstall_error_message(.request_id, .version_id.as_deref(), .messages))]
    #[diagnostic(code(sfpkg::uninstall::failed))]
    PackageUninstall {
        /// The uninstall request ID (06y)
        request_id: String,
        /// The package version being uninstalled, when known
        version_id: Option<String>,
        /// One entry per error reported by the org
        messages: Vec<String>,
    },

    /// The org rejected a request or could not be reached
    #[error("Remote request failed: {message}")]
    #[diagnostic(code(sfpkg::remote))]
    Remote {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// The error message
        message: String,
    },

    /// The command exists but has no implementation yet
    #[error("Not yet implemented: {command}")]
    #[diagnostic(code(sfpkg::not_implemented))]
    NotImplemented {
        /// Command ID, e.g. `package:version:list`
        command: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(sfpkg::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(sfpkg::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable
        path: Option<Box<Path>>,
        /// Description of the operation that failed
        operation: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(code(sfpkg::serialization))]
    Serialization {
        /// The error message describing the serialization issue
        message: String,
    },
}

impl Error {
    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a remote error
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create a not-implemented error for a command ID
    pub fn not_implemented(command: impl Into<String>) -> Self {
        Self::NotImplemented {
            command: command.into(),
        }
    }

    /// Stable error name, reported in JSON output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } => "InvalidIdError",
            Self::ProjectNotFound { .. } => "ProjectNotFoundError",
            Self::PackageAliasNotFound { .. } => "PackageAliasNotFoundError",
            Self::ProjectParse { .. } => "ProjectParseError",
            Self::PackageInstall { .. } => "PackageInstallError",
            Self::PackageUninstall { .. } => "PackageUninstallError",
            Self::Remote { .. } => "RemoteError",
            Self::NotImplemented { .. } => "NotImplementedError",
            Self::Configuration { .. } => "ConfigurationError",
            Self::Io { .. } => "IoError",
            Self::Serialization { .. } => "SerializationError",
        }
    }
}

fn numbered(messages: &[String]) -> String {
    let mut out = String::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}) {message}", i + 1);
    }
    out
}

fn install_error_message(messages: &[String]) -> String {
    format!(
        "Encountered errors installing the package! Installation errors: \n{}",
        numbered(messages)
    )
}

fn uninstall_error_message(request_id: &str, version_id: Option<&str>, messages: &[String]) -> String {
    let package = version_id.unwrap_or("<unknown>");
    if messages.is_empty() {
        return format!("Can't uninstall the package {package} during uninstall request {request_id}.");
    }
    format!(
        "Can't uninstall the package {package} during uninstall request {request_id}.\n=== Errors\n{}",
        numbered(messages)
    )
}

/// Result type for sfpkg operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_error_aggregates_messages() {
        let err = Error::PackageInstall {
            messages: vec!["message 1".to_string(), "message 2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Encountered errors installing the package! Installation errors: \n1) message 1\n2) message 2"
        );
        assert_eq!(err.name(), "PackageInstallError");
    }

    #[test]
    fn test_uninstall_error_lists_errors() {
        let err = Error::PackageUninstall {
            request_id: "06y000000000001AAA".to_string(),
            version_id: Some("04t6A000002zgKSQAY".to_string()),
            messages: vec!["Package is in use".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Can't uninstall the package 04t6A000002zgKSQAY"));
        assert!(msg.ends_with("=== Errors\n1) Package is in use"));
    }

    #[test]
    fn test_invalid_id_names_kind_and_prefix() {
        let err = Error::InvalidId {
            id: "04tBAD".to_string(),
            kind: IdKind::SubscriberPackageVersionId,
        };
        let msg = err.to_string();
        assert!(msg.contains("SubscriberPackageVersionId"));
        assert!(msg.contains("[04tBAD]"));
        assert!(msg.contains("\"04t\""));
    }

    #[test]
    fn test_alias_errors_carry_token() {
        let err = Error::PackageAliasNotFound {
            alias: "myAlias".to_string(),
        };
        assert!(err.to_string().contains("myAlias"));

        let err = Error::ProjectNotFound {
            token: "myAlias".to_string(),
        };
        assert!(err.to_string().contains("myAlias"));
    }

    #[test]
    fn test_configuration_with_help() {
        let err = Error::configuration_with_help("no org", "set SFPKG_ACCESS_TOKEN");
        match err {
            Error::Configuration { message, help } => {
                assert_eq!(message, "no org");
                assert_eq!(help.as_deref(), Some("set SFPKG_ACCESS_TOKEN"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_implemented_message() {
        let err = Error::not_implemented("package:version:list");
        assert_eq!(err.to_string(), "Not yet implemented: package:version:list");
        assert_eq!(err.name(), "NotImplementedError");
    }
}
