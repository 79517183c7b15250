//! User configuration and org connections.
//!
//! Connections are read from `config.toml` in [`crate::paths::config_dir`]:
//!
//! ```toml
//! default_org = "me@example.com"
//! poll_interval_secs = 5
//!
//! [orgs."me@example.com"]
//! instance_url = "https://example.my.salesforce.com"
//! access_token = "00D..."
//! api_version = "55.0"
//! ```
//!
//! `SFPKG_INSTANCE_URL`, `SFPKG_ACCESS_TOKEN`, `SFPKG_USERNAME` and
//! `SFPKG_API_VERSION` override the file. sfpkg never obtains tokens itself.

use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// API version used when neither the file nor the environment sets one.
pub const DEFAULT_API_VERSION: &str = "55.0";

/// Polling interval used when the file does not set one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Org used when `--target-org` is not given
    #[serde(default)]
    pub default_org: Option<String>,

    /// Seconds between status checks while waiting on a request
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    /// Known orgs keyed by username or alias
    #[serde(default)]
    pub orgs: BTreeMap<String, OrgConfig>,
}

/// One `[orgs.<name>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrgConfig {
    /// e.g. `https://example.my.salesforce.com`
    #[serde(default)]
    pub instance_url: Option<String>,
    /// Bearer token for the Tooling API
    #[serde(default)]
    pub access_token: Option<SecretString>,
    /// Defaults to the table name
    #[serde(default)]
    pub username: Option<String>,
    /// Defaults to [`DEFAULT_API_VERSION`]
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Everything needed to call an org's REST API.
#[derive(Debug, Clone)]
pub struct OrgConnection {
    /// e.g. `https://example.my.salesforce.com`
    pub instance_url: String,
    /// Bearer token
    pub access_token: SecretString,
    /// Acting user
    pub username: String,
    /// e.g. `55.0`
    pub api_version: String,
}

/// Connection values taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    /// `SFPKG_INSTANCE_URL`
    pub instance_url: Option<String>,
    /// `SFPKG_ACCESS_TOKEN`
    pub access_token: Option<SecretString>,
    /// `SFPKG_USERNAME`
    pub username: Option<String>,
    /// `SFPKG_API_VERSION`
    pub api_version: Option<String>,
}

impl ConnectionOverrides {
    /// Read `SFPKG_*` connection variables. Empty values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            instance_url: var("SFPKG_INSTANCE_URL"),
            access_token: var("SFPKG_ACCESS_TOKEN").map(SecretString::from),
            username: var("SFPKG_USERNAME"),
            api_version: var("SFPKG_API_VERSION"),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid TOML, unknown keys or a
    /// zero `poll_interval_secs`.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| {
            Error::configuration_with_help(
                format!("Invalid config file: {e}"),
                "See the sfpkg readme for the config.toml format",
            )
        })?;
        if config.poll_interval_secs == Some(0) {
            return Err(Error::configuration_with_help(
                "poll_interval_secs must be at least 1",
                "Remove the key to use the default of 5 seconds",
            ));
        }
        Ok(config)
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read, or a
    /// configuration error if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                debug!(path = %path.display(), "Loading config file");
                Self::parse(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(Error::io(e, Some(path.to_path_buf()), "read config file")),
        }
    }

    /// Load configuration from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&crate::paths::config_file()?)
    }

    /// Interval between status checks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_secs
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs)
    }

    /// Resolve the connection for `target_org`, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no instance URL or access token is
    /// available for the org.
    pub fn resolve_connection(&self, target_org: Option<&str>) -> Result<OrgConnection> {
        self.resolve_connection_with(target_org, &ConnectionOverrides::from_env())
    }

    /// Like [`Config::resolve_connection`] with explicit overrides.
    pub fn resolve_connection_with(
        &self,
        target_org: Option<&str>,
        overrides: &ConnectionOverrides,
    ) -> Result<OrgConnection> {
        let name = target_org.or(self.default_org.as_deref());
        let org = name.and_then(|n| self.orgs.get(n));

        if let (Some(name), None) = (name, org)
            && overrides.access_token.is_none()
        {
            return Err(Error::configuration_with_help(
                format!("No org named '{name}' is configured"),
                format!("Add an [orgs.\"{name}\"] table to config.toml or set SFPKG_INSTANCE_URL and SFPKG_ACCESS_TOKEN"),
            ));
        }

        let missing = || {
            Error::configuration_with_help(
                format!(
                    "No connection configured for {}",
                    name.map_or_else(|| "the default org".to_string(), |n| format!("org '{n}'"))
                ),
                "Set default_org and an [orgs.<name>] table in config.toml, or set SFPKG_INSTANCE_URL and SFPKG_ACCESS_TOKEN",
            )
        };

        let instance_url = overrides
            .instance_url
            .clone()
            .or_else(|| org.and_then(|o| o.instance_url.clone()))
            .ok_or_else(missing)?;
        let access_token = overrides
            .access_token
            .clone()
            .or_else(|| org.and_then(|o| o.access_token.clone()))
            .ok_or_else(missing)?;
        let username = overrides
            .username
            .clone()
            .or_else(|| org.and_then(|o| o.username.clone()))
            .or_else(|| name.map(str::to_string))
            .ok_or_else(|| {
                Error::configuration_with_help(
                    "No username for the connection",
                    "Pass --target-org or set SFPKG_USERNAME",
                )
            })?;
        let api_version = overrides
            .api_version
            .clone()
            .or_else(|| org.and_then(|o| o.api_version.clone()))
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(OrgConnection {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token,
            username,
            api_version,
        })
    }
}
