//! Configuration schema definitions for termstrap.
//!
//! Every field has a default, so an absent or empty `config.yml` yields a
//! complete configuration and the run is driven by host detection alone.

use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentKind;

/// Default shell framework installer.
pub const DEFAULT_FRAMEWORK_INSTALLER: &str =
    "https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh";

/// Default plugin manager download.
pub const DEFAULT_PLUGIN_MANAGER_URL: &str =
    "https://raw.githubusercontent.com/junegunn/vim-plug/master/plug.vim";

/// Default Termux extra-keys row.
pub const DEFAULT_EXTRA_KEYS: &str =
    "extra-keys = [['ESC','/','-','HOME','UP','END','PGUP'],['TAB','CTRL','ALT','LEFT','DOWN','RIGHT','PGDN']]";

/// Default editor init file.
pub const DEFAULT_INIT_FILE: &str = r#"call plug#begin()
Plug 'tpope/vim-sensible'
Plug 'nvim-treesitter/nvim-treesitter'
call plug#end()

set number
set expandtab
set shiftwidth=2
set tabstop=2
"#;

/// Root configuration structure for `config.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TermstrapConfig {
    /// Packages to install
    pub packages: PackagesConfig,

    /// Shell framework and rc file
    pub shell: ShellConfig,

    /// Termux terminal properties
    pub terminal: TerminalConfig,

    /// Editor configuration and plugins
    pub editor: EditorConfig,

    /// SSH key generation
    pub ssh: SshConfig,

    /// Git identity
    pub git: GitConfig,

    /// Tools checked after a successful run
    pub verify: Vec<String>,

    /// Global settings
    pub settings: Settings,
}

impl Default for TermstrapConfig {
    fn default() -> Self {
        Self {
            packages: PackagesConfig::default(),
            shell: ShellConfig::default(),
            terminal: TerminalConfig::default(),
            editor: EditorConfig::default(),
            ssh: SshConfig::default(),
            git: GitConfig::default(),
            verify: strings(&["git", "zsh", "nvim", "curl", "ssh"]),
            settings: Settings::default(),
        }
    }
}

impl TermstrapConfig {
    /// Packages for `kind`: the common list followed by the kind-specific one.
    pub fn packages_for(&self, kind: EnvironmentKind) -> Vec<String> {
        let specific = match kind {
            EnvironmentKind::Termux => &self.packages.termux,
            EnvironmentKind::UbuntuProot => &self.packages.ubuntu,
            EnvironmentKind::OtherProot | EnvironmentKind::Unknown => return Vec::new(),
        };
        let mut packages = self.packages.common.clone();
        for pkg in specific {
            if !packages.contains(pkg) {
                packages.push(pkg.clone());
            }
        }
        packages
    }
}

/// Package lists, split by environment where names differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagesConfig {
    /// Installed everywhere
    pub common: Vec<String>,

    /// Termux only
    pub termux: Vec<String>,

    /// Ubuntu under proot only
    pub ubuntu: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            common: strings(&["git", "zsh", "neovim", "curl"]),
            termux: strings(&["openssh", "clang", "make"]),
            ubuntu: strings(&["openssh-client", "build-essential", "ca-certificates"]),
        }
    }
}

/// Shell framework and rc file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Remote installer for the shell framework
    pub framework_installer: String,

    /// Framework theme written into the rc file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Lines ensured in the rc file
    pub rc_lines: Vec<String>,

    /// Make zsh the login shell
    pub change_login_shell: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            framework_installer: DEFAULT_FRAMEWORK_INSTALLER.to_string(),
            theme: None,
            rc_lines: strings(&["export EDITOR=nvim", "alias vim=nvim"]),
            change_login_shell: true,
        }
    }
}

/// Termux terminal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalConfig {
    /// `extra-keys` line for `termux.properties`; `None` leaves the file alone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_keys: Option<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            extra_keys: Some(DEFAULT_EXTRA_KEYS.to_string()),
        }
    }
}

/// Editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Replace an existing init file whose contents differ
    pub overwrite: bool,

    /// Contents of the init file
    pub init_file: String,

    /// Plugin manager download URL
    pub plugin_manager_url: String,

    /// Compile syntax parsers once plugins are installed
    pub compile_parsers: bool,

    /// Languages whose parsers are compiled
    pub parsers: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            init_file: DEFAULT_INIT_FILE.to_string(),
            plugin_manager_url: DEFAULT_PLUGIN_MANAGER_URL.to_string(),
            compile_parsers: true,
            parsers: strings(&["bash", "lua", "vim"]),
        }
    }
}

/// SSH key settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshConfig {
    /// Generate a key when none exists
    pub generate: bool,

    /// Key algorithm passed to ssh-keygen
    pub key_type: String,

    /// Key comment; defaults to user@host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            generate: true,
            key_type: "ed25519".to_string(),
            comment: None,
        }
    }
}

/// Global Git identity. Both fields or neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Global settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Kill external commands that run longer than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
