//! Configuration file discovery and loading.
//!
//! A config file is optional. Lookup order:
//! 1. An explicit `--config <path>` (must exist)
//! 2. `$XDG_CONFIG_HOME/termstrap/config.yml`
//! 3. `~/.config/termstrap/config.yml`
//!
//! The last two collapse into [`HostPaths::config_file`]. When nothing is
//! found the built-in defaults apply.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::paths::HostPaths;
use crate::config::schema::TermstrapConfig;
use crate::config::validator::validate;
use crate::error::ConfigError;

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file.
    File(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

/// Load, parse and validate the configuration for a run.
pub fn load_config(
    explicit: Option<&Path>,
    paths: &HostPaths,
) -> Result<(TermstrapConfig, ConfigSource), ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Some(path) => Some(path.to_path_buf()),
        None => Some(paths.config_file()).filter(|p| p.exists()),
    };

    let Some(path) = path else {
        debug!("No config file found, using defaults");
        let config = TermstrapConfig::default();
        return Ok((config, ConfigSource::Defaults));
    };

    let config = load_config_file(&path)?;
    validate(&config)?;
    debug!("Loaded config from {}", path.display());
    Ok((config, ConfigSource::File(path)))
}

/// Load a single config file without validating it.
pub fn load_config_file(path: &Path) -> Result<TermstrapConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse YAML content. An empty document yields the defaults.
pub fn parse_config(content: &str, path: &Path) -> Result<TermstrapConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(TermstrapConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_default_file_means_defaults() {
        let temp = TempDir::new().unwrap();
        let paths = HostPaths::with_home(temp.path());

        let (config, source) = load_config(None, &paths).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, TermstrapConfig::default());
    }

    #[test]
    fn default_location_is_discovered() {
        let temp = TempDir::new().unwrap();
        let paths = HostPaths::with_home(temp.path());
        let file = paths.config_file();
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "editor:\n  overwrite: true\n").unwrap();

        let (config, source) = load_config(None, &paths).unwrap();
        assert_eq!(source, ConfigSource::File(file));
        assert!(config.editor.overwrite);
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let paths = HostPaths::with_home(temp.path());
        let missing = temp.path().join("nope.yml");

        let err = load_config(Some(&missing), &paths).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { path } if path == missing));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("bad.yml");
        fs::write(&file, "packages: [unclosed").unwrap();

        let err = load_config(Some(&file), &HostPaths::with_home(temp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.yml");
        fs::write(&file, "git:\n  email: ada@example.com\n").unwrap();

        let err = load_config(Some(&file), &HostPaths::with_home(temp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn empty_file_is_defaults() {
        let config = parse_config("   \n", Path::new("config.yml")).unwrap();
        assert_eq!(config, TermstrapConfig::default());
    }
}
