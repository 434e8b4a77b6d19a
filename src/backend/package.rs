//! Package backend resolution.
//!
//! Maps a detected [`EnvironmentKind`] to the package tool that provisions
//! it. There is no partial backend: unsupported kinds are a configuration
//! error and the run stops before any step executes.

use std::fmt;

use tracing::{debug, info};

use crate::environment::EnvironmentKind;
use crate::error::{ConfigError, StepError};
use crate::shell::{shell_quote, CommandOptions, CommandRunner};

/// The package tool behind a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Termux's lightweight `pkg` wrapper.
    Pkg,
    /// Debian/Ubuntu `apt-get`.
    Apt,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageManager::Pkg => write!(f, "pkg"),
            PackageManager::Apt => write!(f, "apt-get"),
        }
    }
}

/// A command line prefix that takes package names as trailing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    base: String,
}

impl CommandTemplate {
    /// Create a template from its fixed prefix.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// The fixed part of the command.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Render with shell-quoted trailing arguments.
    pub fn render<S: AsRef<str>>(&self, args: &[S]) -> String {
        let mut command = self.base.clone();
        for arg in args {
            command.push(' ');
            command.push_str(&shell_quote(arg.as_ref()));
        }
        command
    }

    fn elevated(&self) -> Self {
        Self::new(format!("sudo {}", self.base))
    }
}

/// A tool the backend needs before it can install anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    /// Executable looked up on PATH.
    pub tool: String,
    /// Package providing it.
    pub package: String,
}

/// What [`PackageBackend::ensure_prerequisite`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrerequisiteOutcome {
    /// This backend has no prerequisite.
    NotRequired,
    /// The tool was already on PATH.
    AlreadyPresent,
    /// The tool was installed by one extra install invocation.
    Installed,
}

/// Update/install commands bound to one environment kind.
#[derive(Debug, Clone)]
pub struct PackageBackend {
    kind: EnvironmentKind,
    manager: PackageManager,
    update: CommandTemplate,
    install: CommandTemplate,
    bootstrap_install: CommandTemplate,
    query: CommandTemplate,
    prerequisite: Option<Prerequisite>,
    env: Vec<(String, String)>,
}

/// Resolve the backend for `kind`, elevating apt when not running as root.
pub fn resolve(kind: EnvironmentKind) -> Result<PackageBackend, ConfigError> {
    resolve_with_privilege(kind, is_root())
}

/// Resolve the backend for `kind` with an explicit privilege level.
pub fn resolve_with_privilege(
    kind: EnvironmentKind,
    is_root: bool,
) -> Result<PackageBackend, ConfigError> {
    let backend = match kind {
        EnvironmentKind::Termux => PackageBackend {
            kind,
            manager: PackageManager::Pkg,
            update: CommandTemplate::new("pkg update -y"),
            install: CommandTemplate::new("pkg install -y"),
            bootstrap_install: CommandTemplate::new("pkg install -y"),
            query: CommandTemplate::new("dpkg -s"),
            prerequisite: None,
            env: Vec::new(),
        },
        EnvironmentKind::UbuntuProot => {
            let update = CommandTemplate::new("apt-get update -y");
            let install = CommandTemplate::new("apt-get install -y");
            // sudo itself is installed without sudo.
            let bootstrap_install = install.clone();
            let (update, install) = if is_root {
                (update, install)
            } else {
                (update.elevated(), install.elevated())
            };
            PackageBackend {
                kind,
                manager: PackageManager::Apt,
                update,
                install,
                bootstrap_install,
                query: CommandTemplate::new("dpkg -s"),
                prerequisite: Some(Prerequisite {
                    tool: "sudo".to_string(),
                    package: "sudo".to_string(),
                }),
                env: vec![("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())],
            }
        }
        EnvironmentKind::OtherProot | EnvironmentKind::Unknown => {
            return Err(ConfigError::UnsupportedEnvironment { kind });
        }
    };

    debug!(
        "Resolved {} backend for {}: update='{}' install='{}'",
        backend.manager,
        kind,
        backend.update.base(),
        backend.install.base()
    );
    Ok(backend)
}

impl PackageBackend {
    /// The environment this backend was resolved for.
    pub fn kind(&self) -> EnvironmentKind {
        self.kind
    }

    /// The package tool in use.
    pub fn manager(&self) -> PackageManager {
        self.manager
    }

    /// The backend prerequisite, if any.
    pub fn prerequisite(&self) -> Option<&Prerequisite> {
        self.prerequisite.as_ref()
    }

    /// The update command template.
    pub fn update_template(&self) -> &CommandTemplate {
        &self.update
    }

    /// The install command template.
    pub fn install_template(&self) -> &CommandTemplate {
        &self.install
    }

    /// Command refreshing the package index.
    pub fn update_command(&self) -> String {
        self.update.render::<&str>(&[])
    }

    /// Command installing `packages`.
    pub fn install_command<S: AsRef<str>>(&self, packages: &[S]) -> String {
        self.install.render(packages)
    }

    /// Command that succeeds when `package` is installed.
    pub fn query_command(&self, package: &str) -> String {
        self.query.render(&[package])
    }

    /// Options (environment) every package command runs with.
    pub fn command_options(&self) -> CommandOptions {
        let mut options = CommandOptions::default();
        for (key, value) in &self.env {
            options.env.insert(key.clone(), value.clone());
        }
        options
    }

    /// Whether `package` is already installed.
    pub fn is_installed(&self, runner: &dyn CommandRunner, package: &str) -> bool {
        runner.check(&format!("{} >/dev/null 2>&1", self.query_command(package)))
    }

    /// Make sure the backend prerequisite is on PATH, installing it if absent.
    pub fn ensure_prerequisite(
        &self,
        runner: &dyn CommandRunner,
        step: &str,
    ) -> Result<PrerequisiteOutcome, StepError> {
        let Some(prereq) = &self.prerequisite else {
            return Ok(PrerequisiteOutcome::NotRequired);
        };

        let probe = format!("command -v {} >/dev/null 2>&1", shell_quote(&prereq.tool));
        if runner.check(&probe) {
            return Ok(PrerequisiteOutcome::AlreadyPresent);
        }

        info!("Installing missing prerequisite '{}'", prereq.tool);
        let command = self.bootstrap_install.render(&[prereq.package.as_str()]);
        let result = runner
            .run(&command, &self.command_options())
            .map_err(|source| StepError::Io {
                step: step.to_string(),
                source,
            })?;

        if result.success {
            Ok(PrerequisiteOutcome::Installed)
        } else {
            Err(StepError::CommandFailed {
                step: step.to_string(),
                command,
                status: result.exit_code,
            })
        }
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CommandResult, MockRunner};

    #[test]
    fn termux_uses_pkg_without_prerequisite() {
        let backend = resolve_with_privilege(EnvironmentKind::Termux, false).unwrap();
        assert_eq!(backend.manager(), PackageManager::Pkg);
        assert_eq!(backend.update_command(), "pkg update -y");
        assert_eq!(
            backend.install_command(&["git", "zsh"]),
            "pkg install -y git zsh"
        );
        assert!(backend.prerequisite().is_none());
    }

    #[test]
    fn ubuntu_as_root_uses_plain_apt() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, true).unwrap();
        assert_eq!(backend.manager(), PackageManager::Apt);
        assert_eq!(backend.update_command(), "apt-get update -y");
        assert_eq!(backend.install_command(&["neovim"]), "apt-get install -y neovim");
        assert_eq!(backend.prerequisite().unwrap().tool, "sudo");
    }

    #[test]
    fn ubuntu_without_root_elevates_with_sudo() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, false).unwrap();
        assert_eq!(backend.update_command(), "sudo apt-get update -y");
        assert!(backend.install_command(&["git"]).starts_with("sudo apt-get install"));
    }

    #[test]
    fn unsupported_kinds_are_config_errors() {
        for kind in [EnvironmentKind::OtherProot, EnvironmentKind::Unknown] {
            let err = resolve_with_privilege(kind, true).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::UnsupportedEnvironment { kind: k } if k == kind
            ));
        }
    }

    #[test]
    fn supported_backends_have_distinct_non_empty_commands() {
        let termux = resolve_with_privilege(EnvironmentKind::Termux, true).unwrap();
        let ubuntu = resolve_with_privilege(EnvironmentKind::UbuntuProot, true).unwrap();
        for backend in [&termux, &ubuntu] {
            assert!(!backend.update_command().is_empty());
            assert!(!backend.install_template().base().is_empty());
        }
        assert_ne!(termux.update_command(), ubuntu.update_command());
        assert_ne!(termux.install_template(), ubuntu.install_template());
    }

    #[test]
    fn apt_commands_run_noninteractive() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, true).unwrap();
        let options = backend.command_options();
        assert_eq!(
            options.env.get("DEBIAN_FRONTEND").map(String::as_str),
            Some("noninteractive")
        );
    }

    #[test]
    fn install_command_quotes_arguments() {
        let backend = resolve_with_privilege(EnvironmentKind::Termux, true).unwrap();
        assert_eq!(
            backend.install_command(&["odd name"]),
            "pkg install -y 'odd name'"
        );
    }

    #[test]
    fn prerequisite_not_required_on_termux() {
        let backend = resolve_with_privilege(EnvironmentKind::Termux, true).unwrap();
        let runner = MockRunner::new();
        let outcome = backend.ensure_prerequisite(&runner, "packages").unwrap();
        assert_eq!(outcome, PrerequisiteOutcome::NotRequired);
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn prerequisite_present_runs_no_install() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, true).unwrap();
        let runner = MockRunner::new();
        let outcome = backend.ensure_prerequisite(&runner, "packages").unwrap();
        assert_eq!(outcome, PrerequisiteOutcome::AlreadyPresent);
        assert_eq!(runner.count_matching("install"), 0);
    }

    #[test]
    fn missing_prerequisite_costs_one_install() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, false).unwrap();
        let runner = MockRunner::new().fail_on("command -v sudo", 1);
        let outcome = backend.ensure_prerequisite(&runner, "packages").unwrap();
        assert_eq!(outcome, PrerequisiteOutcome::Installed);
        assert_eq!(runner.count_matching("install -y sudo"), 1);
        assert!(runner
            .commands()
            .contains(&"apt-get install -y sudo".to_string()));
    }

    #[test]
    fn failed_prerequisite_install_is_command_failure() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, true).unwrap();
        let runner = MockRunner::new()
            .fail_on("command -v sudo", 1)
            .fail_on("install -y sudo", 100);
        let err = backend.ensure_prerequisite(&runner, "packages").unwrap_err();
        assert!(matches!(
            err,
            StepError::CommandFailed { status: Some(100), .. }
        ));
    }

    struct Unspawnable;

    impl CommandRunner for Unspawnable {
        fn run(&self, _command: &str, _options: &CommandOptions) -> std::io::Result<CommandResult> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "sh: not found"))
        }
    }

    #[test]
    fn unspawnable_prerequisite_install_keeps_io_error() {
        let backend = resolve_with_privilege(EnvironmentKind::UbuntuProot, true).unwrap();
        let err = backend.ensure_prerequisite(&Unspawnable, "packages").unwrap_err();
        match err {
            StepError::Io { step, source } => {
                assert_eq!(step, "packages");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn is_installed_uses_dpkg_query() {
        let backend = resolve_with_privilege(EnvironmentKind::Termux, true).unwrap();
        let runner = MockRunner::new().fail_on("dpkg -s nvim", 1);
        assert!(backend.is_installed(&runner, "git"));
        assert!(!backend.is_installed(&runner, "nvim"));
    }
}
