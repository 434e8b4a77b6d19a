//! Error types for termstrap operations.
//!
//! The taxonomy mirrors the phases of a run:
//!
//! - [`ConfigError`] - anything that stops a run before sequencing starts
//!   (unsupported environment, unreadable or invalid configuration)
//! - [`StepError`] - a provisioning step that could not complete
//! - [`SequenceHalted`] - a required step failed; carries the partial report
//! - [`TermstrapError`] - the top-level error returned to `main`

use std::path::PathBuf;
use thiserror::Error;

use crate::environment::EnvironmentKind;
use crate::runner::RunReport;

/// Errors raised before any provisioning step runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The host was classified as something no package backend supports.
    #[error("Unsupported environment: {kind} (expected Termux or Ubuntu under proot)")]
    UnsupportedEnvironment { kind: EnvironmentKind },

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Configuration parsed but holds unusable values.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Failure of a single provisioning step.
#[derive(Debug, Error)]
pub enum StepError {
    /// An external command exited unsuccessfully (or was killed).
    #[error("Step '{step}' failed: command exited with {}: {command}", format_status(*status))]
    CommandFailed {
        step: String,
        command: String,
        status: Option<i32>,
    },

    /// Something the step depends on is missing or cannot be created.
    #[error("Step '{step}' cannot run: {message}")]
    PreconditionUnmet { step: String, message: String },

    /// Filesystem error while the step was writing host state.
    #[error("Step '{step}' hit an IO error: {source}")]
    Io {
        step: String,
        #[source]
        source: std::io::Error,
    },
}

impl StepError {
    /// Name of the step that failed.
    pub fn step(&self) -> &str {
        match self {
            StepError::CommandFailed { step, .. }
            | StepError::PreconditionUnmet { step, .. }
            | StepError::Io { step, .. } => step,
        }
    }
}

fn format_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("code {}", code),
        None => "no exit code".to_string(),
    }
}

/// A required step failed and the sequencer stopped.
///
/// The report holds every outcome recorded up to and including the failure.
#[derive(Debug, Error)]
#[error("Provisioning halted: {error}")]
pub struct SequenceHalted {
    /// Outcomes recorded before the sequencer stopped.
    pub report: RunReport,
    /// The failure that stopped the run.
    #[source]
    pub error: StepError,
}

/// Core error type for termstrap.
#[derive(Debug, Error)]
pub enum TermstrapError {
    /// Configuration or environment error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Step failure outside of a sequenced run.
    #[error(transparent)]
    Step(#[from] StepError),

    /// A sequenced run stopped at a required step.
    #[error(transparent)]
    Halted(#[from] Box<SequenceHalted>),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TermstrapError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            TermstrapError::Config(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for termstrap operations.
pub type Result<T> = std::result::Result<T, TermstrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_environment_names_kind() {
        let err = ConfigError::UnsupportedEnvironment {
            kind: EnvironmentKind::OtherProot,
        };
        assert!(err.to_string().contains("other proot"));
    }

    #[test]
    fn parse_error_displays_path_and_message() {
        let err = ConfigError::Parse {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn command_failed_displays_step_command_and_code() {
        let err = StepError::CommandFailed {
            step: "install-packages".into(),
            command: "pkg install -y git".into(),
            status: Some(100),
        };
        let msg = err.to_string();
        assert!(msg.contains("install-packages"));
        assert!(msg.contains("pkg install -y git"));
        assert!(msg.contains("code 100"));
    }

    #[test]
    fn command_failed_without_status() {
        let err = StepError::CommandFailed {
            step: "fetch".into(),
            command: "curl x".into(),
            status: None,
        };
        assert!(err.to_string().contains("no exit code"));
    }

    #[test]
    fn step_accessor_returns_step_name() {
        let err = StepError::PreconditionUnmet {
            step: "install-plugins".into(),
            message: "plugin manager missing".into(),
        };
        assert_eq!(err.step(), "install-plugins");
    }

    #[test]
    fn config_errors_exit_with_two() {
        let err: TermstrapError = ConfigError::Invalid {
            message: "x".into(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn halted_runs_exit_with_one() {
        let halted = SequenceHalted {
            report: RunReport::new(),
            error: StepError::PreconditionUnmet {
                step: "a".into(),
                message: "b".into(),
            },
        };
        let err: TermstrapError = Box::new(halted).into();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("Provisioning halted"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: TermstrapError = io_err.into();
        assert!(matches!(err, TermstrapError::Io(_)));
    }
}
