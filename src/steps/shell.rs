//! Shell framework, rc-file and generic command steps.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StepError;
use crate::shell::{shell_quote, CommandOptions};

use super::{CompletedCheck, ProvisioningStep, StepContext};

/// Downloads the shell framework's installer, then runs it unattended.
///
/// The fetch and the install are separate commands so a failed download
/// fails the step instead of feeding an empty script to `sh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallShellFramework {
    install_dir: PathBuf,
    installer_url: String,
}

impl InstallShellFramework {
    /// Install into `install_dir` (e.g. `~/.oh-my-zsh`) from `installer_url`.
    pub fn new(install_dir: impl Into<PathBuf>, installer_url: impl Into<String>) -> Self {
        Self {
            install_dir: install_dir.into(),
            installer_url: installer_url.into(),
        }
    }

    /// Where the installer script is saved between fetch and run.
    fn script_path(&self) -> PathBuf {
        let parent = self.install_dir.parent().unwrap_or(Path::new("."));
        parent.join(".termstrap-framework-install.sh")
    }

    fn fetch_command(&self, script: &Path) -> String {
        format!(
            "curl -fsSL -o {} {}",
            shell_quote(&script.to_string_lossy()),
            shell_quote(&self.installer_url)
        )
    }

    fn install_command(&self, script: &Path) -> String {
        format!("sh {} --unattended", shell_quote(&script.to_string_lossy()))
    }
}

impl ProvisioningStep for InstallShellFramework {
    fn name(&self) -> &str {
        "install shell framework"
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        Some(CompletedCheck::FileExists {
            path: self.install_dir.clone(),
        })
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let script = self.script_path();
        ctx.run(self.name(), &self.fetch_command(&script))?;

        // Keep the installer from exec'ing zsh or prompting for chsh.
        let options = CommandOptions::default()
            .with_env("RUNZSH", "no")
            .with_env("CHSH", "no")
            .with_env("ZSH", &self.install_dir.to_string_lossy());
        let installed = ctx.run_with(self.name(), &self.install_command(&script), options);

        if let Err(e) = fs::remove_file(&script) {
            debug!("could not remove {}: {}", script.display(), e);
        }
        installed?;
        Ok(())
    }
}

/// Appends `line` to a file unless an identical line is already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureLine {
    label: String,
    path: PathBuf,
    line: String,
}

impl EnsureLine {
    /// `label` names the step in the report.
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, line: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            line: line.into(),
        }
    }

    /// The file being edited.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProvisioningStep for EnsureLine {
    fn name(&self) -> &str {
        &self.label
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        Some(CompletedCheck::LineInFile {
            path: self.path.clone(),
            line: self.line.clone(),
        })
    }

    fn run(&self, _ctx: &StepContext<'_>) -> Result<(), StepError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StepError::PreconditionUnmet {
                step: self.label.clone(),
                message: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }

        let io_err = |source| StepError::Io {
            step: self.label.clone(),
            source,
        };

        let needs_newline = match fs::read(&self.path) {
            Ok(existing) => existing.last().is_some_and(|b| *b != b'\n'),
            Err(_) => false,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        if needs_newline {
            writeln!(file).map_err(io_err)?;
        }
        writeln!(file, "{}", self.line).map_err(io_err)?;
        Ok(())
    }
}

/// Sets the line starting with `prefix` to `line`, appending it when no
/// such line exists.
///
/// Used for assignments the framework template already carries, such as
/// `ZSH_THEME=`. Every matching line is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetLine {
    label: String,
    path: PathBuf,
    prefix: String,
    line: String,
}

impl SetLine {
    pub fn new(
        label: impl Into<String>,
        path: impl Into<PathBuf>,
        prefix: impl Into<String>,
        line: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            prefix: prefix.into(),
            line: line.into(),
        }
    }

    fn rewrite(&self, existing: &str) -> String {
        let mut replaced = false;
        let mut out = String::with_capacity(existing.len() + self.line.len() + 1);
        for current in existing.lines() {
            if current.starts_with(&self.prefix) {
                out.push_str(&self.line);
                replaced = true;
            } else {
                out.push_str(current);
            }
            out.push('\n');
        }
        if !replaced {
            out.push_str(&self.line);
            out.push('\n');
        }
        out
    }
}

impl ProvisioningStep for SetLine {
    fn name(&self) -> &str {
        &self.label
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        Some(CompletedCheck::LineInFile {
            path: self.path.clone(),
            line: self.line.clone(),
        })
    }

    fn run(&self, _ctx: &StepContext<'_>) -> Result<(), StepError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StepError::PreconditionUnmet {
                step: self.label.clone(),
                message: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }

        let io_err = |source| StepError::Io {
            step: self.label.clone(),
            source,
        };

        let existing = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(io_err(e)),
        };
        let updated = self.rewrite(&existing);
        fs::write(&self.path, &updated).map_err(io_err)?;

        if !updated.lines().any(|l| l == self.line) {
            return Err(StepError::PreconditionUnmet {
                step: self.label.clone(),
                message: format!("'{}' still missing from {}", self.line, self.path.display()),
            });
        }
        Ok(())
    }
}

/// A single external command with an optional completed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommand {
    name: String,
    command: String,
    check: Option<CompletedCheck>,
}

impl RunCommand {
    /// Run `command`, reported under `name`.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            check: None,
        }
    }

    /// Skip the command when `check` passes.
    pub fn with_check(mut self, check: CompletedCheck) -> Self {
        self.check = Some(check);
        self
    }

    /// The command line.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl ProvisioningStep for RunCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        self.check.clone()
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        ctx.run(&self.name, &self.command)?;
        Ok(())
    }
}
