//! termstrap - Idempotent terminal environment bootstrap.
//!
//! termstrap turns a fresh Termux install, or an Ubuntu guest running
//! under proot, into a ready development shell: packages, zsh with a
//! framework, an editor with plugins, an SSH key and a Git identity. Every
//! step checks whether its work is already done, so re-running is safe.
//!
//! # Modules
//!
//! - [`environment`] - Host classification (Termux, proot Ubuntu, ...)
//! - [`backend`] - Package manager commands per environment
//! - [`config`] - Optional YAML configuration and host paths
//! - [`steps`] - Provisioning steps and the ordered plan
//! - [`runner`] - The sequencer and run reports
//! - [`shell`] - External command execution and run logs
//! - [`verify`] - Post-run tool verification
//! - [`ui`] - Spinners, tables, and terminal output
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use termstrap::backend::resolve;
//! use termstrap::environment::EnvironmentKind;
//!
//! let backend = resolve(EnvironmentKind::Termux).unwrap();
//! assert_eq!(backend.update_command(), "pkg update -y");
//! assert!(resolve(EnvironmentKind::Unknown).is_err());
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;
pub mod verify;

pub use error::{ConfigError, Result, StepError, TermstrapError};
