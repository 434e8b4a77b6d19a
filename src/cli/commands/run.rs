//! Run command implementation.
//!
//! The default command: detect the host, resolve its package backend, run
//! the provisioning plan in order, record the outcome, and verify the
//! installed tools.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::backend::{resolve, PackageBackend};
use crate::config::{load_config, ConfigSource, HostPaths};
use crate::environment::EnvironmentProbe;
use crate::error::{Result, SequenceHalted, StepError};
use crate::runner::{format_duration, LastRun, RunProgress, RunReport, Sequencer, StepOutcome};
use crate::shell::{CommandRunner, RunLog, ShellRunner};
use crate::steps::{build_plan, PlannedStep};
use crate::ui::{LiveOutput, SpinnerHandle, TermstrapTheme, UserInterface};

use super::dispatcher::{Command, CommandResult};
use super::verify::show_verification;

/// Lines of command output kept under the active spinner.
const LIVE_LINES: usize = 3;

/// The run command implementation.
pub struct RunCommand {
    paths: HostPaths,
    config: Option<PathBuf>,
    run_log: Option<Arc<RunLog>>,
    colors: bool,
    probe: EnvironmentProbe,
}

impl RunCommand {
    pub fn new(paths: HostPaths, config: Option<PathBuf>) -> Self {
        Self {
            paths,
            config,
            run_log: None,
            colors: false,
            probe: EnvironmentProbe::new(),
        }
    }

    /// Append to this log instead of opening one.
    pub fn with_run_log(mut self, log: Arc<RunLog>) -> Self {
        self.run_log = Some(log);
        self
    }

    /// Style live command output.
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    fn open_log(&self) -> Result<Arc<RunLog>> {
        match &self.run_log {
            Some(log) => Ok(Arc::clone(log)),
            None => Ok(Arc::new(RunLog::open(&self.paths.state_dir())?)),
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (config, source) = load_config(self.config.as_deref(), &self.paths)?;
        if let ConfigSource::File(path) = &source {
            info!("Using config {}", path.display());
        }

        let detection = self.probe.detect();
        let backend = resolve(detection.kind)?;
        let plan = build_plan(detection.kind, &config, &self.paths)?;
        let timeout = config.settings.command_timeout_secs.map(Duration::from_secs);

        let log = self.open_log()?;
        let mut live = LiveOutput::new(4, LIVE_LINES, TermstrapTheme::for_colors(self.colors));
        if ui.output_mode().shows_command_output() {
            live = live.echo_all();
        }
        let mut runner = ShellRunner::new()
            .with_log(Arc::clone(&log))
            .with_default_timeout(timeout);
        if ui.output_mode().shows_spinners() {
            runner = runner.with_output_callback(live.callback());
        }

        ui.show_header(&format!("termstrap · {}", detection.kind));
        ui.show_field("Package manager", &backend.manager().to_string());
        ui.show_field("Steps", &plan.len().to_string());

        let started_at = Utc::now();
        let outcome = run_plan(&backend, &runner, &plan, timeout, &live, ui);

        let state_dir = self.paths.state_dir();
        let (report, halted) = match &outcome {
            Ok(report) => (report.clone(), false),
            Err(h) => (h.report.clone(), true),
        };
        match LastRun::new(detection.kind, started_at, report, halted).save(&state_dir) {
            Ok(path) => info!("Recorded run in {}", path.display()),
            Err(e) => warn!("Could not record run: {:#}", e),
        }

        match outcome {
            Ok(report) => {
                show_completion(&report, ui);
                show_verification(&runner, &config.verify, ui);
                Ok(CommandResult::success())
            }
            Err(halted) => {
                show_halt(&halted, &log, ui);
                Ok(CommandResult::failure(1))
            }
        }
    }
}

/// Run `plan`, driving one spinner per step.
fn run_plan(
    backend: &PackageBackend,
    runner: &dyn CommandRunner,
    plan: &[PlannedStep],
    timeout: Option<Duration>,
    live: &LiveOutput,
    ui: &mut dyn UserInterface,
) -> std::result::Result<RunReport, SequenceHalted> {
    let details = ui.output_mode().shows_details();
    let mut spinner: Option<Box<dyn SpinnerHandle>> = None;

    let result = Sequencer::new(backend, runner)
        .with_timeout(timeout)
        .run_with_progress(plan, |event| match event {
            RunProgress::StepStarting { name, index, total } => {
                let msg = format!("[{}/{}] {}", index + 1, total, name);
                let handle = ui.start_spinner(&msg);
                if let Some(bar) = handle.progress_bar() {
                    live.attach(bar, &msg);
                }
                spinner = Some(handle);
            }
            RunProgress::StepSkipped { name, reason } => {
                live.detach();
                if let Some(mut s) = spinner.take() {
                    if details {
                        s.finish_skipped(&format!("{} ({})", name, reason));
                    } else {
                        s.finish_skipped(name);
                    }
                }
            }
            RunProgress::StepFinished { record } => {
                live.detach();
                if let Some(mut s) = spinner.take() {
                    match &record.outcome {
                        StepOutcome::Failed { .. } => s.finish_error(&record.name),
                        _ => s.finish_success(&format!(
                            "{} ({})",
                            record.name,
                            format_duration(record.duration)
                        )),
                    }
                }
            }
        });

    live.detach();
    result
}

fn show_completion(report: &RunReport, ui: &mut dyn UserInterface) {
    for record in report.entries().iter().filter(|r| r.outcome.is_failed()) {
        ui.warning(&record.summary_line());
    }
    ui.success(&format!(
        "Provisioning complete: {} in {}",
        report.summary(),
        format_duration(report.total_duration())
    ));
}

fn show_halt(halted: &SequenceHalted, log: &RunLog, ui: &mut dyn UserInterface) {
    ui.error(&halted.error.to_string());

    let logs = format!(
        "stdout log: {}\nstderr log: {}",
        log.stdout_path().display(),
        log.stderr_path().display()
    );
    match &halted.error {
        StepError::CommandFailed { command, .. } => ui.show_error_block(command, &logs),
        _ => ui.show_error_block(halted.error.step(), &logs),
    }

    ui.message("Completed before the failure:");
    for record in halted.report.entries() {
        ui.message(&format!("  {}", record.summary_line()));
    }
    ui.message("Fix the problem and run termstrap again; finished steps will be skipped.");
}
