//! Location of sfpkg's user configuration.
//!
//! | Platform | Config Dir |
//! |----------|------------|
//! | **macOS** | `~/Library/Application Support/sfpkg` |
//! | **Linux** | `~/.config/sfpkg` (XDG_CONFIG_HOME) |
//! | **Windows** | `%APPDATA%\sfpkg` |
//!
//! `SFPKG_CONFIG_DIR` overrides the directory for testing and CI.

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable overriding [`config_dir`].
pub const CONFIG_DIR_ENV: &str = "SFPKG_CONFIG_DIR";

/// Get the configuration directory for sfpkg.
///
/// Resolution order:
/// 1. `SFPKG_CONFIG_DIR` environment variable
/// 2. Platform config directory + `/sfpkg`
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let base = dirs::config_dir()
        .ok_or_else(|| Error::configuration("Could not determine config directory"))?;

    Ok(base.join("sfpkg"))
}

/// Get the path to the user configuration file.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_default() {
        temp_env::with_var_unset(CONFIG_DIR_ENV, || {
            let dir = config_dir().expect("config_dir should succeed");
            assert!(dir.ends_with("sfpkg"), "Should end with sfpkg: {:?}", dir);
        });
    }

    #[test]
    fn test_config_dir_override() {
        let test_dir = "/tmp/sfpkg-test-config";
        temp_env::with_var(CONFIG_DIR_ENV, Some(test_dir), || {
            let dir = config_dir().expect("config_dir should succeed");
            assert_eq!(dir, PathBuf::from(test_dir));
        });
    }

    #[test]
    fn test_empty_override_is_ignored() {
        temp_env::with_var(CONFIG_DIR_ENV, Some(""), || {
            let dir = config_dir().expect("config_dir should succeed");
            assert!(dir.ends_with("sfpkg"));
        });
    }

    #[test]
    fn test_config_file() {
        temp_env::with_var(CONFIG_DIR_ENV, Some("/tmp/sfpkg-test-config"), || {
            let file = config_file().expect("config_file should succeed");
            assert_eq!(file, PathBuf::from("/tmp/sfpkg-test-config/config.toml"));
        });
    }
}
