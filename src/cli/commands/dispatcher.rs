//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::args::{Cli, Commands};
use crate::config::HostPaths;
use crate::error::Result;
use crate::shell::RunLog;
use crate::ui::UserInterface;

use super::completions::CompletionsCommand;
use super::detect::DetectCommand;
use super::run::RunCommand;
use super::verify::VerifyCommand;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: u8,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: u8) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    paths: HostPaths,
    config: Option<PathBuf>,
    run_log: Option<Arc<RunLog>>,
    colors: bool,
}

impl CommandDispatcher {
    pub fn new(paths: HostPaths) -> Self {
        Self {
            paths,
            config: None,
            run_log: None,
            colors: false,
        }
    }

    /// Use this config file instead of the default location.
    pub fn with_config(mut self, config: Option<PathBuf>) -> Self {
        self.config = config;
        self
    }

    /// Reuse an already-open run log (main opens it early for tracing).
    pub fn with_run_log(mut self, log: Option<Arc<RunLog>>) -> Self {
        self.run_log = log;
        self
    }

    /// Style output that bypasses the UI (live command output).
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            None | Some(Commands::Run) => {
                let mut cmd = RunCommand::new(self.paths.clone(), self.config.clone())
                    .with_colors(self.colors);
                if let Some(log) = &self.run_log {
                    cmd = cmd.with_run_log(Arc::clone(log));
                }
                cmd.execute(ui)
            }
            Some(Commands::Detect) => DetectCommand::new(self.paths.clone()).execute(ui),
            Some(Commands::Verify) => {
                VerifyCommand::new(self.paths.clone(), self.config.clone()).execute(ui)
            }
            Some(Commands::Completions(args)) => CompletionsCommand::new(args.clone()).execute(ui),
        }
    }
}
