//! Configuration loading, parsing, and validation for termstrap.
//!
//! This module handles:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//! - Host directory resolution in [`paths`]
//!
//! # Example
//!
//! ```
//! use termstrap::config::{load_config, ConfigSource, HostPaths};
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let paths = HostPaths::with_home(temp.path());
//!
//! let (config, source) = load_config(None, &paths).unwrap();
//! assert_eq!(source, ConfigSource::Defaults);
//! assert!(!config.editor.overwrite);
//! ```

pub mod loader;
pub mod paths;
pub mod schema;
pub mod validator;

pub use loader::{load_config, load_config_file, parse_config, ConfigSource};
pub use paths::HostPaths;
pub use schema::{
    EditorConfig, GitConfig, PackagesConfig, Settings, ShellConfig, SshConfig, TerminalConfig,
    TermstrapConfig,
};
pub use validator::{validate, validate_config, ValidationError};
