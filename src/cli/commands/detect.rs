//! Detect command implementation.
//!
//! `termstrap detect` shows the host classification, every signal behind
//! it, and the package backend a run would use. Nothing is modified.

use tracing::debug;

use crate::backend::resolve;
use crate::config::HostPaths;
use crate::environment::{Detection, EnvironmentProbe};
use crate::error::Result;
use crate::runner::LastRun;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Exit code when the host cannot be provisioned.
const UNSUPPORTED_EXIT: u8 = 2;

/// The detect command implementation.
pub struct DetectCommand {
    paths: HostPaths,
    probe: EnvironmentProbe,
}

impl DetectCommand {
    pub fn new(paths: HostPaths) -> Self {
        Self {
            paths,
            probe: EnvironmentProbe::new(),
        }
    }

    /// Show a detection result; returns the command outcome.
    fn show(&self, detection: &Detection, ui: &mut dyn UserInterface) -> CommandResult {
        ui.show_header("termstrap detect");
        ui.show_field("Environment", &detection.kind.to_string());

        if detection.signals.is_empty() {
            ui.show_field("Signals", "none");
        } else {
            ui.show_field("Signals", "");
            for signal in &detection.signals {
                ui.message(&format!("    - {}", signal));
            }
        }

        let result = match resolve(detection.kind) {
            Ok(backend) => {
                ui.show_field("Package manager", &backend.manager().to_string());
                ui.show_field("Update", &backend.update_command());
                ui.show_field("Install", backend.install_template().base());
                if let Some(pre) = backend.prerequisite() {
                    ui.show_field("Prerequisite", &pre.tool);
                }
                CommandResult::success()
            }
            Err(e) => {
                ui.error(&e.to_string());
                CommandResult::failure(UNSUPPORTED_EXIT)
            }
        };

        match LastRun::load(&self.paths.state_dir()) {
            Ok(Some(last)) => ui.show_field(
                "Last run",
                &format!(
                    "{} on {}, {}{}",
                    last.finished_at.format("%Y-%m-%d %H:%M"),
                    last.environment,
                    last.report.summary(),
                    if last.halted { " (halted)" } else { "" }
                ),
            ),
            Ok(None) => {}
            Err(e) => debug!("Could not read last run: {:#}", e),
        }

        result
    }
}

impl Command for DetectCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let detection = self.probe.detect();
        Ok(self.show(&detection, ui))
    }
}
