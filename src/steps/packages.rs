//! Package installation through the resolved backend.

use tracing::info;

use crate::backend::PrerequisiteOutcome;
use crate::error::StepError;

use super::{CompletedCheck, ProvisioningStep, StepContext};

/// Ensures the backend prerequisite, refreshes the index, installs `packages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPackages {
    packages: Vec<String>,
}

impl InstallPackages {
    /// Install the given packages.
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// The packages this step installs.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }
}

impl ProvisioningStep for InstallPackages {
    fn name(&self) -> &str {
        "install packages"
    }

    fn completed_check(&self, ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        let mut checks: Vec<CompletedCheck> = self
            .packages
            .iter()
            .map(|pkg| CompletedCheck::CommandSucceeds {
                command: format!("{} >/dev/null 2>&1", ctx.backend.query_command(pkg)),
            })
            .collect();

        if let Some(prereq) = ctx.backend.prerequisite() {
            checks.push(CompletedCheck::CommandSucceeds {
                command: format!("command -v {} >/dev/null 2>&1", prereq.tool),
            });
        }

        Some(CompletedCheck::All { checks })
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let backend = ctx.backend;

        if backend.ensure_prerequisite(ctx.runner, self.name())? == PrerequisiteOutcome::Installed {
            info!("Installed {} backend prerequisite", backend.manager());
        }

        let options = backend.command_options();
        ctx.run_with(self.name(), &backend.update_command(), options.clone())?;

        if self.packages.is_empty() {
            return Ok(());
        }

        info!("Installing {} packages", self.packages.len());
        ctx.run_with(self.name(), &backend.install_command(&self.packages), options)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::resolve_with_privilege;
    use crate::environment::EnvironmentKind;
    use crate::shell::MockRunner;
    use crate::steps::{execute, Execution};

    #[test]
    fn termux_runs_update_then_install() {
        let backend = resolve_with_privilege(EnvironmentKind::Termux, false).unwrap();
        let runner = MockRunner::new().fail_on("dpkg -s", 1);
        let ctx = StepContext::new(&backend, &runner);

        let step = InstallPackages::new(["git", "zsh"]);
        assert_eq!(execute(&step, &ctx).unwrap(), Execution::Completed);

        let commands = runner.commands();
        let update = commands.iter().position(|c| c == "pkg update -y").unwrap();
        let install = commands
            .iter()
            .position(|c| c == "pkg install -y git zsh")
            .unwrap();
        assert!(update < install);
    }

    #[test]
    fn skipped_when_everything_is_installed() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, true).unwrap();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);

        let outcome = execute(&InstallPackages::new(["git"]), &ctx).unwrap();
        assert!(matches!(outcome, Execution::Skipped(_)));
        assert_eq!(runner.count_matching("apt-get"), 0);
    }

    #[test]
    fn ubuntu_installs_missing_sudo_first() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, false).unwrap();
        let runner = MockRunner::new()
            .fail_on("command -v sudo", 1)
            .fail_on("dpkg -s", 1);
        let ctx = StepContext::new(&backend, &runner);

        execute(&InstallPackages::new(["git"]), &ctx).unwrap();

        let commands = runner.commands();
        let sudo = commands
            .iter()
            .position(|c| c == "apt-get install -y sudo")
            .unwrap();
        let update = commands
            .iter()
            .position(|c| c == "sudo apt-get update -y")
            .unwrap();
        assert!(sudo < update);
        assert_eq!(runner.count_matching("install -y sudo"), 1);
    }

    #[test]
    fn install_failure_is_command_failed() {
        let backend = resolve_with_privilege(EnvironmentKind::Termux, false).unwrap();
        let runner = MockRunner::new()
            .fail_on("dpkg -s", 1)
            .fail_on("pkg install", 100);
        let ctx = StepContext::new(&backend, &runner);

        let err = execute(&InstallPackages::new(["nope"]), &ctx).unwrap_err();
        assert!(matches!(
            err,
            StepError::CommandFailed { status: Some(100), .. }
        ));
    }
}
