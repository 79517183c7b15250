//! `sfdx-project.json` discovery and parsing.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the project configuration.
pub const PROJECT_FILE: &str = "sfdx-project.json";

/// Contents of `sfdx-project.json`.
///
/// Only the fields the package commands read are typed; everything else is
/// kept in `extra` so the file round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectJson {
    /// Source directories, one per package.
    #[serde(default)]
    pub package_directories: Vec<PackageDirectory>,

    /// Alias name to package or package version ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_aliases: Option<IndexMap<String, String>>,

    /// Namespace prefix registered for the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Login URL used when authorizing orgs for this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sfdc_login_url: Option<String>,

    /// API version the source is written against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_api_version: Option<String>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `packageDirectories`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDirectory {
    /// Directory relative to the project root.
    pub path: String,

    /// Whether this is the default package directory.
    #[serde(default)]
    pub default: bool,

    /// Package name or alias this directory builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Name of the next version, e.g. `Spring '25`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,

    /// `major.minor.patch.build`, build may be `NEXT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<String>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Salesforce DX project located on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SfProject {
    root: PathBuf,
    json: ProjectJson,
}

impl SfProject {
    /// Build a project from already parsed contents.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, json: ProjectJson) -> Self {
        Self {
            root: root.into(),
            json,
        }
    }

    /// Walk up from `start` to the nearest directory containing [`PROJECT_FILE`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no ancestor holds a project file.
    pub fn resolve_project_root(start: &Path) -> Result<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_FILE).is_file())
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                Error::configuration_with_help(
                    format!(
                        "No {PROJECT_FILE} found in {} or any parent directory",
                        start.display()
                    ),
                    "Run this command from within a Salesforce DX project",
                )
            })
    }

    /// Load the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`Error::ProjectParse`] if it is not valid project JSON.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_FILE);
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::io(e, Some(path.clone()), "read project file"))?;
        let json: ProjectJson =
            serde_json::from_str(&contents).map_err(|e| Error::ProjectParse {
                path: path.clone().into_boxed_path(),
                message: e.to_string(),
            })?;
        debug!(
            path = %path.display(),
            aliases = json.package_aliases.as_ref().map_or(0, IndexMap::len),
            "Loaded project file"
        );
        Ok(Self::new(root, json))
    }

    /// Find and load the project containing `start`.
    ///
    /// # Errors
    ///
    /// See [`SfProject::resolve_project_root`] and [`SfProject::load`].
    pub fn discover(start: &Path) -> Result<Self> {
        let root = Self::resolve_project_root(start)?;
        Self::load(&root)
    }

    /// Project root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed project file.
    #[must_use]
    pub const fn json(&self) -> &ProjectJson {
        &self.json
    }

    /// Look up a single alias.
    #[must_use]
    pub fn package_alias(&self, alias: &str) -> Option<&str> {
        self.json
            .package_aliases
            .as_ref()
            .and_then(|aliases| aliases.get(alias))
            .map(String::as_str)
    }

    /// All aliases in file order.
    pub fn package_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.json
            .package_aliases
            .iter()
            .flatten()
            .map(|(alias, id)| (alias.as_str(), id.as_str()))
    }
}
