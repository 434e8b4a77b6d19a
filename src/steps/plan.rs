//! The provisioning plan.
//!
//! Order matters: the framework installer writes the rc file template
//! before rc lines are ensured, the plugin manager must exist before
//! plugins are installed, and parsers compile from an installed plugin.

use crate::config::{HostPaths, TermstrapConfig};
use crate::environment::EnvironmentKind;
use crate::error::ConfigError;

use super::{
    CompileParsers, CompletedCheck, ConfigureEditor, ConfigureGitIdentity, EnsureLine,
    GenerateSshKey, InstallPackages, InstallPluginManager, InstallPlugins, InstallShellFramework,
    PlannedStep, RunCommand, SetLine,
};

/// Build the ordered step list for `kind`.
pub fn build_plan(
    kind: EnvironmentKind,
    config: &TermstrapConfig,
    paths: &HostPaths,
) -> Result<Vec<PlannedStep>, ConfigError> {
    if !kind.is_supported() {
        return Err(ConfigError::UnsupportedEnvironment { kind });
    }

    let mut plan = vec![
        PlannedStep::required(InstallPackages::new(config.packages_for(kind))),
        PlannedStep::required(InstallShellFramework::new(
            paths.shell_framework_dir(),
            &config.shell.framework_installer,
        )),
    ];

    let zshrc = paths.zshrc();
    if let Some(theme) = &config.shell.theme {
        plan.push(PlannedStep::required(SetLine::new(
            "set shell theme",
            &zshrc,
            "ZSH_THEME=",
            format!("ZSH_THEME=\"{}\"", theme),
        )));
    }

    for line in &config.shell.rc_lines {
        plan.push(PlannedStep::required(EnsureLine::new(
            format!("rc: {}", line),
            &zshrc,
            line,
        )));
    }

    if kind == EnvironmentKind::Termux {
        if let Some(keys) = &config.terminal.extra_keys {
            plan.push(PlannedStep::required(EnsureLine::new(
                "terminal extra keys",
                paths.termux_properties(),
                keys,
            )));
            plan.push(PlannedStep::best_effort(RunCommand::new(
                "reload terminal settings",
                "termux-reload-settings",
            )));
        }
    }

    if config.shell.change_login_shell {
        let command = match kind {
            EnvironmentKind::Termux => "chsh -s zsh",
            _ => "chsh -s \"$(command -v zsh)\"",
        };
        plan.push(PlannedStep::best_effort(
            RunCommand::new("change login shell", command).with_check(
                CompletedCheck::CommandSucceeds {
                    command: "test \"$(basename \"${SHELL:-}\")\" = zsh".to_string(),
                },
            ),
        ));
    }

    plan.push(PlannedStep::required(ConfigureEditor::new(
        paths.editor_init(),
        &config.editor.init_file,
        config.editor.overwrite,
    )));
    plan.push(PlannedStep::required(InstallPluginManager::new(
        paths.plugin_manager(),
        &config.editor.plugin_manager_url,
    )));

    plan.push(PlannedStep::required(InstallPlugins::new(
        paths.plugin_manager(),
        paths.plugin_dir(),
    )));
    if config.editor.compile_parsers {
        plan.push(PlannedStep::required(CompileParsers::new(
            paths.treesitter_dir(),
            paths.parser_dir(),
            &config.editor.parsers,
        )));
    }

    if config.ssh.generate {
        let comment = config.ssh.comment.clone().unwrap_or_else(|| {
            let host = match kind {
                EnvironmentKind::Termux => "termux",
                _ => "ubuntu",
            };
            format!("{}@{}", paths.user.as_deref().unwrap_or("termstrap"), host)
        });
        plan.push(PlannedStep::required(GenerateSshKey::new(
            paths.ssh_key(&config.ssh.key_type),
            &config.ssh.key_type,
            comment,
        )));
    }

    if let (Some(name), Some(email)) = (&config.git.name, &config.git.email) {
        plan.push(PlannedStep::required(ConfigureGitIdentity::new(name, email)));
    }

    Ok(plan)
}
