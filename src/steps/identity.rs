//! SSH key and Git identity steps.

use std::fs;
use std::path::PathBuf;

use crate::error::StepError;
use crate::shell::shell_quote;

use super::{CompletedCheck, ProvisioningStep, StepContext};

/// Generates an SSH key pair with an empty passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSshKey {
    path: PathBuf,
    key_type: String,
    comment: String,
}

impl GenerateSshKey {
    pub fn new(path: impl Into<PathBuf>, key_type: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key_type: key_type.into(),
            comment: comment.into(),
        }
    }

    fn command(&self) -> String {
        format!(
            "ssh-keygen -q -t {} -C {} -f {} -N ''",
            shell_quote(&self.key_type),
            shell_quote(&self.comment),
            shell_quote(&self.path.to_string_lossy())
        )
    }
}

impl ProvisioningStep for GenerateSshKey {
    fn name(&self) -> &str {
        "generate ssh key"
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        Some(CompletedCheck::FileExists {
            path: self.path.clone(),
        })
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| StepError::PreconditionUnmet {
                step: self.name().to_string(),
                message: format!("cannot create {}: {}", dir.display(), e),
            })?;
            restrict_permissions(dir);
        }

        ctx.run(self.name(), &self.command())?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(dir: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).ok();
}

#[cfg(not(unix))]
fn restrict_permissions(_dir: &std::path::Path) {}

/// Sets the global Git author name and email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureGitIdentity {
    name: String,
    email: String,
}

impl ConfigureGitIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    fn settings(&self) -> [(&'static str, &str); 2] {
        [("user.name", &self.name), ("user.email", &self.email)]
    }
}

impl ProvisioningStep for ConfigureGitIdentity {
    fn name(&self) -> &str {
        "configure git identity"
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        let checks = self
            .settings()
            .iter()
            .map(|(key, value)| CompletedCheck::CommandOutputEquals {
                command: format!("git config --global --get {}", key),
                expected: value.to_string(),
            })
            .collect();
        Some(CompletedCheck::All { checks })
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        for (key, value) in self.settings() {
            ctx.run(
                self.name(),
                &format!("git config --global {} {}", key, shell_quote(value)),
            )?;
        }
        Ok(())
    }
}
