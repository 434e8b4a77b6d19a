//! Host path resolution.
//!
//! Every file termstrap reads or writes is derived from `HOME`, the Termux
//! `PREFIX` and the XDG base directories. Lookups go through an injectable
//! environment function so tests never depend on the real host.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Directory name under the XDG config/state homes.
pub const APP_DIR: &str = "termstrap";

/// Resolved host directories for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    /// User home directory.
    pub home: PathBuf,
    /// Termux installation prefix, when set.
    pub prefix: Option<PathBuf>,
    /// `$XDG_DATA_HOME` or `~/.local/share`.
    pub data_home: PathBuf,
    /// `$XDG_CONFIG_HOME` or `~/.config`.
    pub config_home: PathBuf,
    /// `$XDG_STATE_HOME` or `~/.local/state`.
    pub state_home: PathBuf,
    /// Login name, when known.
    pub user: Option<String>,
}

impl HostPaths {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| {
            let value = env::var(key).ok();
            if key == "HOME" {
                value.or_else(|| dirs::home_dir().map(|p| p.to_string_lossy().into_owned()))
            } else {
                value
            }
        })
    }

    /// Resolve using a custom environment lookup.
    pub fn from_env_with<F>(env_fn: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = env_fn("HOME")
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::Invalid {
                message: "HOME is not set".to_string(),
            })?;

        let xdg = |key: &str, fallback: &[&str]| {
            env_fn(key)
                .map(PathBuf::from)
                .filter(|p| p.is_absolute())
                .unwrap_or_else(|| fallback.iter().fold(home.clone(), |p, c| p.join(c)))
        };

        Ok(Self {
            data_home: xdg("XDG_DATA_HOME", &[".local", "share"]),
            config_home: xdg("XDG_CONFIG_HOME", &[".config"]),
            state_home: xdg("XDG_STATE_HOME", &[".local", "state"]),
            prefix: env_fn("PREFIX").filter(|p| !p.is_empty()).map(PathBuf::from),
            user: env_fn("USER").filter(|u| !u.is_empty()),
            home,
        })
    }

    /// Paths rooted at `home` with default XDG directories.
    pub fn with_home(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref().to_path_buf();
        Self {
            data_home: home.join(".local").join("share"),
            config_home: home.join(".config"),
            state_home: home.join(".local").join("state"),
            prefix: None,
            user: None,
            home,
        }
    }

    /// Default config file location.
    pub fn config_file(&self) -> PathBuf {
        self.config_home.join(APP_DIR).join("config.yml")
    }

    /// Where run logs and the last-run record live.
    pub fn state_dir(&self) -> PathBuf {
        self.state_home.join(APP_DIR)
    }

    /// The zsh rc file.
    pub fn zshrc(&self) -> PathBuf {
        self.home.join(".zshrc")
    }

    /// Shell framework install directory.
    pub fn shell_framework_dir(&self) -> PathBuf {
        self.home.join(".oh-my-zsh")
    }

    /// Termux terminal properties file.
    pub fn termux_properties(&self) -> PathBuf {
        self.home.join(".termux").join("termux.properties")
    }

    /// Editor init file.
    pub fn editor_init(&self) -> PathBuf {
        self.config_home.join("nvim").join("init.vim")
    }

    /// Plugin manager script in the editor's autoload directory.
    pub fn plugin_manager(&self) -> PathBuf {
        self.data_home
            .join("nvim")
            .join("site")
            .join("autoload")
            .join("plug.vim")
    }

    /// Where the plugin manager installs plugins.
    pub fn plugin_dir(&self) -> PathBuf {
        self.data_home.join("nvim").join("plugged")
    }

    /// The syntax parser plugin, once plugins are installed.
    pub fn treesitter_dir(&self) -> PathBuf {
        self.plugin_dir().join("nvim-treesitter")
    }

    /// Compiled syntax parsers.
    pub fn parser_dir(&self) -> PathBuf {
        self.treesitter_dir().join("parser")
    }

    /// Private key path for `key_type`.
    pub fn ssh_key(&self, key_type: &str) -> PathBuf {
        self.home.join(".ssh").join(format!("id_{}", key_type))
    }
}
