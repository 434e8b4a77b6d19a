//! Editor configuration and plugin steps.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::StepError;
use crate::shell::shell_quote;

use super::{CompletedCheck, ProvisioningStep, StepContext};

/// Headless editor binary used for plugin work.
pub const EDITOR_BIN: &str = "nvim";

/// Writes the editor init file.
///
/// With `overwrite` unset the file is written only when absent. With it
/// set, differing contents are replaced; identical contents are left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureEditor {
    path: PathBuf,
    contents: String,
    overwrite: bool,
}

impl ConfigureEditor {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>, overwrite: bool) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            overwrite,
        }
    }
}

impl ProvisioningStep for ConfigureEditor {
    fn name(&self) -> &str {
        "configure editor"
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        let check = if self.overwrite {
            CompletedCheck::FileContentEquals {
                path: self.path.clone(),
                contents: self.contents.clone(),
            }
        } else {
            CompletedCheck::FileExists {
                path: self.path.clone(),
            }
        };
        Some(check)
    }

    fn run(&self, _ctx: &StepContext<'_>) -> Result<(), StepError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| StepError::PreconditionUnmet {
                step: self.name().to_string(),
                message: format!("cannot create editor config directory {}: {}", dir.display(), e),
            })?;
        }

        fs::write(&self.path, &self.contents).map_err(|source| StepError::Io {
            step: self.name().to_string(),
            source,
        })?;
        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

/// Downloads the plugin manager into the editor's autoload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPluginManager {
    target: PathBuf,
    url: String,
}

impl InstallPluginManager {
    pub fn new(target: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            url: url.into(),
        }
    }
}

impl ProvisioningStep for InstallPluginManager {
    fn name(&self) -> &str {
        "install plugin manager"
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        Some(CompletedCheck::FileExists {
            path: self.target.clone(),
        })
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let command = format!(
            "curl -fLo {} --create-dirs {}",
            shell_quote(&self.target.to_string_lossy()),
            shell_quote(&self.url)
        );
        ctx.run(self.name(), &command)?;
        Ok(())
    }
}

/// Installs editor plugins through the plugin manager.
///
/// Fails with [`StepError::PreconditionUnmet`] when the manager is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlugins {
    manager: PathBuf,
    plugin_dir: PathBuf,
}

impl InstallPlugins {
    /// `manager` is the plugin manager file; `plugin_dir` where plugins land.
    pub fn new(manager: impl Into<PathBuf>, plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            manager: manager.into(),
            plugin_dir: plugin_dir.into(),
        }
    }
}

impl ProvisioningStep for InstallPlugins {
    fn name(&self) -> &str {
        "install editor plugins"
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        Some(CompletedCheck::All {
            checks: vec![
                CompletedCheck::FileExists {
                    path: self.manager.clone(),
                },
                CompletedCheck::FileExists {
                    path: self.plugin_dir.clone(),
                },
            ],
        })
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        if !self.manager.is_file() {
            return Err(StepError::PreconditionUnmet {
                step: self.name().to_string(),
                message: format!("plugin manager not installed at {}", self.manager.display()),
            });
        }

        ctx.run(
            self.name(),
            &format!("{} --headless +PlugInstall +qall", EDITOR_BIN),
        )?;
        Ok(())
    }
}

/// Compiles syntax parsers with a headless editor.
///
/// Needs the parser plugin on disk, so it runs after [`InstallPlugins`].
/// Complete once a compiled parser exists for every language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileParsers {
    plugin: PathBuf,
    parser_dir: PathBuf,
    languages: Vec<String>,
}

impl CompileParsers {
    /// `plugin` is the installed parser plugin; compiled parsers land in
    /// `parser_dir` as `<language>.so`.
    pub fn new<I, S>(
        plugin: impl Into<PathBuf>,
        parser_dir: impl Into<PathBuf>,
        languages: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            plugin: plugin.into(),
            parser_dir: parser_dir.into(),
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    fn parser(&self, language: &str) -> PathBuf {
        self.parser_dir.join(format!("{}.so", language))
    }

    fn missing(&self) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|lang| !self.parser(lang).is_file())
            .map(String::as_str)
            .collect()
    }
}

impl ProvisioningStep for CompileParsers {
    fn name(&self) -> &str {
        "compile parsers"
    }

    fn completed_check(&self, _ctx: &StepContext<'_>) -> Option<CompletedCheck> {
        Some(CompletedCheck::All {
            checks: self
                .languages
                .iter()
                .map(|lang| CompletedCheck::FileExists {
                    path: self.parser(lang),
                })
                .collect(),
        })
    }

    fn run(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        if !self.plugin.is_dir() {
            return Err(StepError::PreconditionUnmet {
                step: self.name().to_string(),
                message: format!("parser plugin not installed at {}", self.plugin.display()),
            });
        }

        let install = format!("+TSInstallSync! {}", self.languages.join(" "));
        ctx.run(
            self.name(),
            &format!("{} --headless {} +qall", EDITOR_BIN, shell_quote(&install)),
        )?;

        let missing = self.missing();
        if !missing.is_empty() {
            return Err(StepError::PreconditionUnmet {
                step: self.name().to_string(),
                message: format!(
                    "no compiled parser for {} in {}",
                    missing.join(", "),
                    self.parser_dir.display()
                ),
            });
        }
        debug!("compiled parsers: {}", self.languages.join(", "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{resolve_with_privilege, PackageBackend};
    use crate::environment::EnvironmentKind;
    use crate::shell::{CommandResult, MockRunner};
    use crate::steps::{execute, Execution};
    use std::time::Duration;
    use tempfile::TempDir;

    fn backend() -> PackageBackend {
        resolve_with_privilege(EnvironmentKind::Termux, false).unwrap()
    }

    #[test]
    fn editor_written_when_absent_then_skipped() {
        let temp = TempDir::new().unwrap();
        let init = temp.path().join("nvim").join("init.vim");
        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);
        let step = ConfigureEditor::new(&init, "set number\n", false);

        assert_eq!(execute(&step, &ctx).unwrap(), Execution::Completed);
        assert_eq!(fs::read_to_string(&init).unwrap(), "set number\n");
        assert!(matches!(execute(&step, &ctx).unwrap(), Execution::Skipped(_)));
    }

    #[test]
    fn editor_without_overwrite_keeps_user_file() {
        let temp = TempDir::new().unwrap();
        let init = temp.path().join("init.vim");
        fs::write(&init, "user config").unwrap();

        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);
        let outcome = execute(&ConfigureEditor::new(&init, "ours", false), &ctx).unwrap();

        assert!(matches!(outcome, Execution::Skipped(_)));
        assert_eq!(fs::read_to_string(&init).unwrap(), "user config");
    }

    #[test]
    fn editor_with_overwrite_replaces_differing_file() {
        let temp = TempDir::new().unwrap();
        let init = temp.path().join("init.vim");
        fs::write(&init, "user config").unwrap();

        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);
        let step = ConfigureEditor::new(&init, "ours", true);

        assert_eq!(execute(&step, &ctx).unwrap(), Execution::Completed);
        assert_eq!(fs::read_to_string(&init).unwrap(), "ours");
        assert!(matches!(execute(&step, &ctx).unwrap(), Execution::Skipped(_)));
    }

    #[test]
    fn editor_uncreatable_directory_is_precondition_unmet() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("nvim");
        fs::write(&blocker, "not a directory").unwrap();

        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);
        let err = execute(
            &ConfigureEditor::new(blocker.join("sub").join("init.vim"), "x", true),
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, StepError::PreconditionUnmet { .. }));
    }

    #[test]
    fn plugins_require_manager() {
        let temp = TempDir::new().unwrap();
        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);
        let step = InstallPlugins::new(temp.path().join("plug.vim"), temp.path().join("plugged"));

        let err = execute(&step, &ctx).unwrap_err();
        assert!(matches!(err, StepError::PreconditionUnmet { .. }));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn plugins_run_headless_editor() {
        let temp = TempDir::new().unwrap();
        let manager = temp.path().join("plug.vim");
        fs::write(&manager, "").unwrap();

        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);
        execute(&InstallPlugins::new(&manager, temp.path().join("plugged")), &ctx).unwrap();

        assert_eq!(runner.commands(), vec!["nvim --headless +PlugInstall +qall"]);
    }

    fn parser_step(temp: &TempDir) -> (CompileParsers, PathBuf) {
        let plugin = temp.path().join("plugged").join("nvim-treesitter");
        let parsers = plugin.join("parser");
        (CompileParsers::new(&plugin, &parsers, ["lua", "vim"]), parsers)
    }

    #[test]
    fn parsers_require_installed_plugin() {
        let temp = TempDir::new().unwrap();
        let (step, _) = parser_step(&temp);
        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);

        let err = execute(&step, &ctx).unwrap_err();
        assert!(matches!(err, StepError::PreconditionUnmet { .. }));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn parsers_compile_then_skip() {
        let temp = TempDir::new().unwrap();
        let (step, parsers) = parser_step(&temp);
        fs::create_dir_all(&parsers).unwrap();

        let backend = backend();
        let out = parsers.clone();
        let runner = MockRunner::new().on("TSInstallSync", move |_| {
            fs::write(out.join("lua.so"), "").unwrap();
            fs::write(out.join("vim.so"), "").unwrap();
            CommandResult::success(String::new(), String::new(), Duration::ZERO)
        });
        let ctx = StepContext::new(&backend, &runner);

        assert_eq!(execute(&step, &ctx).unwrap(), Execution::Completed);
        assert_eq!(
            runner.commands(),
            vec!["nvim --headless '+TSInstallSync! lua vim' +qall"]
        );
        assert!(matches!(execute(&step, &ctx).unwrap(), Execution::Skipped(_)));
    }

    #[test]
    fn parsers_missing_after_compile_fail() {
        let temp = TempDir::new().unwrap();
        let (step, parsers) = parser_step(&temp);
        fs::create_dir_all(&parsers).unwrap();
        fs::write(parsers.join("lua.so"), "").unwrap();

        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);

        let err = execute(&step, &ctx).unwrap_err();
        assert!(err.to_string().contains("no compiled parser for vim in"));
    }

    #[test]
    fn plugin_manager_downloads_to_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("autoload").join("plug.vim");
        let backend = backend();
        let runner = MockRunner::new();
        let ctx = StepContext::new(&backend, &runner);

        execute(&InstallPluginManager::new(&target, "https://example.com/plug.vim"), &ctx).unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("curl -fLo "));
        assert!(commands[0].ends_with("--create-dirs https://example.com/plug.vim"));
    }
}
