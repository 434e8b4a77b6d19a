//! Step execution.
//!
//! Evaluates a step's completed check and, if the work is not already
//! done, runs it against the resolved backend and command runner.

use std::time::Duration;

use tracing::debug;

use crate::backend::PackageBackend;
use crate::error::StepError;
use crate::shell::{CommandOptions, CommandResult, CommandRunner};

use super::completed_check::{run_check, CheckResult};
use super::ProvisioningStep;

/// What a step needs to execute.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// The package backend resolved for this run.
    pub backend: &'a PackageBackend,

    /// Where external commands go.
    pub runner: &'a dyn CommandRunner,

    /// Per-command timeout, when configured.
    pub timeout: Option<Duration>,
}

impl<'a> StepContext<'a> {
    /// Create a context with no command timeout.
    pub fn new(backend: &'a PackageBackend, runner: &'a dyn CommandRunner) -> Self {
        Self {
            backend,
            runner,
            timeout: None,
        }
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `command` on behalf of `step`, failing on a non-zero exit.
    pub fn run(&self, step: &str, command: &str) -> Result<CommandResult, StepError> {
        self.run_with(step, command, CommandOptions::default())
    }

    /// Run with explicit options; the context timeout fills in when unset.
    pub fn run_with(
        &self,
        step: &str,
        command: &str,
        mut options: CommandOptions,
    ) -> Result<CommandResult, StepError> {
        if options.timeout.is_none() {
            options.timeout = self.timeout;
        }

        debug!("[{}] $ {}", step, command);
        let result = self
            .runner
            .run(command, &options)
            .map_err(|source| StepError::Io {
                step: step.to_string(),
                source,
            })?;

        if result.success {
            Ok(result)
        } else {
            if result.timed_out {
                debug!("[{}] command timed out after {:?}", step, result.duration);
            }
            Err(StepError::CommandFailed {
                step: step.to_string(),
                command: command.to_string(),
                status: result.exit_code,
            })
        }
    }
}

impl std::fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("backend", &self.backend.manager())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// How a step ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// The completed check passed; nothing was run.
    Skipped(CheckResult),
    /// The step ran to completion.
    Completed,
}

/// Check, then run, a single step.
pub fn execute(step: &dyn ProvisioningStep, ctx: &StepContext<'_>) -> Result<Execution, StepError> {
    if let Some(check) = step.completed_check(ctx) {
        let result = run_check(&check, ctx.runner);
        if result.complete {
            debug!("Skipping '{}': {}", step.name(), result.description);
            return Ok(Execution::Skipped(result));
        }
        debug!(
            "'{}' not complete: {}",
            step.name(),
            result.details.as_deref().unwrap_or(&result.description)
        );
    }

    step.run(ctx)?;
    Ok(Execution::Completed)
}
