//! Provisioning steps.
//!
//! This module provides the step contract the sequencer drives:
//!
//! - [`ProvisioningStep`] - a named unit of work with an optional idempotency check
//! - [`StepContext`] - the backend and command runner a step executes against
//! - [`PlannedStep`] - a step plus its best-effort flag, as placed in a plan
//! - [`execute`] - check-then-run for a single step
//! - [`CompletedCheck`] / [`run_check`] - declarative idempotency predicates
//! - [`build_plan`] - the ordered step list for an environment
//!
//! # Example
//!
//! ```
//! use termstrap::backend::resolve_with_privilege;
//! use termstrap::environment::EnvironmentKind;
//! use termstrap::shell::MockRunner;
//! use termstrap::steps::{execute, Execution, RunCommand, StepContext};
//!
//! let backend = resolve_with_privilege(EnvironmentKind::Termux, false).unwrap();
//! let runner = MockRunner::new();
//! let ctx = StepContext::new(&backend, &runner);
//!
//! let step = RunCommand::new("reload settings", "termux-reload-settings");
//! assert_eq!(execute(&step, &ctx).unwrap(), Execution::Completed);
//! ```

pub mod completed_check;
pub mod editor;
pub mod executor;
pub mod identity;
pub mod packages;
pub mod plan;
pub mod shell;

pub use completed_check::{run_check, CheckResult, CompletedCheck};
pub use editor::{CompileParsers, ConfigureEditor, InstallPluginManager, InstallPlugins};
pub use executor::{execute, Execution, StepContext};
pub use identity::{ConfigureGitIdentity, GenerateSshKey};
pub use packages::InstallPackages;
pub use plan::build_plan;
pub use shell::{EnsureLine, InstallShellFramework, RunCommand, SetLine};

use crate::error::StepError;

/// A named, idempotent unit of provisioning work.
///
/// Steps are value-like descriptors: everything they touch is resolved when
/// they are built, and they never reference other steps. Ordering belongs
/// to the sequencer.
pub trait ProvisioningStep: Send + Sync {
    /// Name used in logs and the run report.
    fn name(&self) -> &str;

    /// Predicate that, when complete, lets the step be skipped.
    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        None
    }

    /// Perform the step.
    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError>;
}

/// A step as placed in a plan.
pub struct PlannedStep {
    step: Box<dyn ProvisioningStep>,
    best_effort: bool,
}

impl PlannedStep {
    /// A step whose failure halts the run.
    pub fn required(step: impl ProvisioningStep + 'static) -> Self {
        Self {
            step: Box::new(step),
            best_effort: false,
        }
    }

    /// A step whose failure is recorded but does not halt the run.
    pub fn best_effort(step: impl ProvisioningStep + 'static) -> Self {
        Self {
            step: Box::new(step),
            best_effort: true,
        }
    }

    /// The step's name.
    pub fn name(&self) -> &str {
        self.step.name()
    }

    /// Whether failure is tolerated.
    pub fn is_best_effort(&self) -> bool {
        self.best_effort
    }

    /// The wrapped step.
    pub fn step(&self) -> &dyn ProvisioningStep {
        self.step.as_ref()
    }
}

impl std::fmt::Debug for PlannedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannedStep")
            .field("name", &self.name())
            .field("best_effort", &self.best_effort)
            .finish()
    }
}
