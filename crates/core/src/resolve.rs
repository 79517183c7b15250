//! Package alias resolution.
//!
//! Commands that act on a package version accept either a `04t` ID or an
//! alias defined in the project's `packageAliases`. Resolution only touches
//! the project file when the token is not already a version ID.

use crate::ids::{IdKind, validate_id};
use crate::project::SfProject;
use crate::{Error, Result};
use std::path::PathBuf;
use tracing::debug;

/// Supplies the project used to resolve aliases.
///
/// Loading is deferred until an alias actually needs resolving.
pub trait ProjectSource {
    /// Load the project.
    ///
    /// # Errors
    ///
    /// Any error means no project is available.
    fn load_project(&self) -> Result<SfProject>;
}

/// Discovers the project by walking up from a directory.
#[derive(Debug, Clone)]
pub struct DiscoverProject {
    start: PathBuf,
}

impl DiscoverProject {
    /// Discover from `start`.
    #[must_use]
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Discover from the process working directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the working directory is unavailable.
    pub fn from_current_dir() -> Result<Self> {
        std::env::current_dir()
            .map(Self::new)
            .map_err(|e| Error::io(e, None, "read current directory"))
    }
}

impl ProjectSource for DiscoverProject {
    fn load_project(&self) -> Result<SfProject> {
        SfProject::discover(&self.start)
    }
}

impl ProjectSource for SfProject {
    fn load_project(&self) -> Result<SfProject> {
        Ok(self.clone())
    }
}

impl<F> ProjectSource for F
where
    F: Fn() -> Result<SfProject>,
{
    fn load_project(&self) -> Result<SfProject> {
        self()
    }
}

/// Resolve a package version ID or alias to a package version ID.
///
/// Tokens starting with `04t` are validated and returned unchanged without
/// loading the project. Anything else is looked up in `packageAliases` and
/// the mapped value is validated before it is returned.
///
/// # Errors
///
/// - [`Error::InvalidId`] if the token or the aliased value is not a valid
///   `SubscriberPackageVersionId`
/// - [`Error::ProjectNotFound`] if the project cannot be loaded
/// - [`Error::PackageAliasNotFound`] if the alias is not defined
pub fn resolve_subscriber_package_version_id<P>(token: &str, projects: &P) -> Result<String>
where
    P: ProjectSource + ?Sized,
{
    let kind = IdKind::SubscriberPackageVersionId;

    if token.starts_with(kind.prefix()) {
        validate_id(token, kind)?;
        return Ok(token.to_string());
    }

    let project = projects.load_project().map_err(|e| {
        debug!(token, error = %e, "Project unavailable for alias resolution");
        Error::ProjectNotFound {
            token: token.to_string(),
        }
    })?;

    let resolved = project
        .package_alias(token)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            let known: Vec<&str> = project.package_aliases().map(|(alias, _)| alias).collect();
            debug!(alias = token, ?known, "Package alias not defined");
            Error::PackageAliasNotFound {
                alias: token.to_string(),
            }
        })?;

    validate_id(resolved, kind)?;
    debug!(alias = token, id = resolved, "Resolved package alias");
    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectJson;
    use indexmap::IndexMap;
    use std::cell::Cell;

    const VERSION_ID: &str = "04t6A000002zgKSQAY";

    fn project_with(aliases: &[(&str, &str)]) -> SfProject {
        let aliases: IndexMap<String, String> = aliases
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SfProject::new(
            "/project",
            ProjectJson {
                package_aliases: Some(aliases),
                ..ProjectJson::default()
            },
        )
    }

    /// Counts how often the project was requested.
    struct CountingSource {
        project: Option<SfProject>,
        loads: Cell<usize>,
    }

    impl ProjectSource for CountingSource {
        fn load_project(&self) -> Result<SfProject> {
            self.loads.set(self.loads.get() + 1);
            self.project
                .clone()
                .ok_or_else(|| Error::configuration("no project"))
        }
    }

    #[test]
    fn test_version_id_returned_unchanged_without_loading() {
        let source = CountingSource {
            project: None,
            loads: Cell::new(0),
        };
        let resolved = resolve_subscriber_package_version_id(VERSION_ID, &source).unwrap();
        assert_eq!(resolved, VERSION_ID);
        assert_eq!(source.loads.get(), 0);
    }

    #[test]
    fn test_invalid_version_id_never_consults_aliases() {
        let source = CountingSource {
            project: Some(project_with(&[("04tBROKEN", VERSION_ID)])),
            loads: Cell::new(0),
        };
        let err = resolve_subscriber_package_version_id("04tBROKEN", &source).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidId {
                kind: IdKind::SubscriberPackageVersionId,
                ..
            }
        ));
        assert_eq!(source.loads.get(), 0);
    }

    #[test]
    fn test_alias_resolves_to_mapped_id() {
        let project = project_with(&[("dreamhouse@1.0.0-1", VERSION_ID)]);
        let resolved =
            resolve_subscriber_package_version_id("dreamhouse@1.0.0-1", &project).unwrap();
        assert_eq!(resolved, VERSION_ID);
    }

    #[test]
    fn test_alias_to_invalid_id_fails_validation() {
        let project = project_with(&[("dreamhouse", "0Ho6A000000XZfGSAW")]);
        let err = resolve_subscriber_package_version_id("dreamhouse", &project).unwrap_err();
        assert!(matches!(err, Error::InvalidId { id, .. } if id == "0Ho6A000000XZfGSAW"));
    }

    #[test]
    fn test_missing_alias() {
        let project = project_with(&[("other", VERSION_ID)]);
        let err = resolve_subscriber_package_version_id("myAlias", &project).unwrap_err();
        assert!(matches!(&err, Error::PackageAliasNotFound { alias } if alias == "myAlias"));
        assert!(err.to_string().contains("myAlias"));
    }

    #[test]
    fn test_empty_alias_value_is_missing() {
        let project = project_with(&[("blank", "")]);
        let err = resolve_subscriber_package_version_id("blank", &project).unwrap_err();
        assert!(matches!(err, Error::PackageAliasNotFound { .. }));
    }

    #[test]
    fn test_project_failure_carries_token() {
        let source = || -> Result<SfProject> { Err(Error::configuration("no project")) };
        let err = resolve_subscriber_package_version_id("myAlias", &source).unwrap_err();
        assert!(matches!(&err, Error::ProjectNotFound { token } if token == "myAlias"));
    }

    #[test]
    fn test_discovery_outside_project_is_project_not_found() {
        let temp = tempfile::TempDir::new().unwrap();
        let source = DiscoverProject::new(temp.path());
        let err = resolve_subscriber_package_version_id("myAlias", &source).unwrap_err();
        assert!(matches!(&err, Error::ProjectNotFound { token } if token == "myAlias"));
    }
}
