//! Ordered step execution.

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::backend::PackageBackend;
use crate::error::SequenceHalted;
use crate::shell::CommandRunner;
use crate::steps::{execute, Execution, PlannedStep, StepContext};

use super::report::{RunReport, StepOutcome, StepRecord};

/// Progress events emitted while a plan runs.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to start.
    StepStarting {
        name: &'a str,
        index: usize,
        total: usize,
    },
    /// A step was already complete.
    StepSkipped { name: &'a str, reason: &'a str },
    /// A step ran, successfully or not.
    StepFinished { record: &'a StepRecord },
}

/// Runs planned steps strictly in order against one backend.
///
/// The first failure of a required step stops the run; later steps are
/// neither executed nor recorded. Best-effort failures are recorded and
/// the run continues.
pub struct Sequencer<'a> {
    backend: &'a PackageBackend,
    runner: &'a dyn CommandRunner,
    timeout: Option<Duration>,
}

impl<'a> Sequencer<'a> {
    pub fn new(backend: &'a PackageBackend, runner: &'a dyn CommandRunner) -> Self {
        Self {
            backend,
            runner,
            timeout: None,
        }
    }

    /// Kill external commands that exceed `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the plan.
    pub fn run(&self, steps: &[PlannedStep]) -> Result<RunReport, SequenceHalted> {
        self.run_with_progress(steps, |_| {})
    }

    /// Run the plan with a progress callback.
    pub fn run_with_progress(
        &self,
        steps: &[PlannedStep],
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunReport, SequenceHalted> {
        let ctx = StepContext::new(self.backend, self.runner).with_timeout(self.timeout);
        let total = steps.len();
        let mut report = RunReport::new();

        for (index, planned) in steps.iter().enumerate() {
            let name = planned.name();
            on_progress(RunProgress::StepStarting { name, index, total });

            let start = Instant::now();
            let result = execute(planned.step(), &ctx);
            let duration = start.elapsed();

            match result {
                Ok(Execution::Skipped(check)) => {
                    let reason = check.short_description().to_string();
                    info!("[{}/{}] {} skipped: {}", index + 1, total, name, reason);
                    on_progress(RunProgress::StepSkipped {
                        name,
                        reason: &reason,
                    });
                    report.push(StepRecord {
                        name: name.to_string(),
                        outcome: StepOutcome::Skipped { reason },
                        best_effort: planned.is_best_effort(),
                        duration,
                    });
                }
                Ok(Execution::Completed) => {
                    info!("[{}/{}] {} succeeded", index + 1, total, name);
                    report.push(StepRecord {
                        name: name.to_string(),
                        outcome: StepOutcome::Succeeded,
                        best_effort: planned.is_best_effort(),
                        duration,
                    });
                    if let Some(record) = report.entries().last() {
                        on_progress(RunProgress::StepFinished { record });
                    }
                }
                Err(err) => {
                    report.push(StepRecord {
                        name: name.to_string(),
                        outcome: StepOutcome::Failed {
                            reason: err.to_string(),
                        },
                        best_effort: planned.is_best_effort(),
                        duration,
                    });
                    if let Some(record) = report.entries().last() {
                        on_progress(RunProgress::StepFinished { record });
                    }

                    if planned.is_best_effort() {
                        warn!("[{}/{}] {} failed (best effort): {}", index + 1, total, name, err);
                        continue;
                    }

                    error!("[{}/{}] {} failed, halting: {}", index + 1, total, name, err);
                    return Err(SequenceHalted { report, error: err });
                }
            }
        }

        info!("Provisioning finished: {}", report.summary());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::resolve_with_privilege;
    use crate::environment::EnvironmentKind;
    use crate::error::StepError;
    use crate::shell::MockRunner;
    use crate::steps::{CompletedCheck, RunCommand};

    fn backend() -> PackageBackend {
        resolve_with_privilege(EnvironmentKind::Termux, false).unwrap()
    }

    #[test]
    fn runs_steps_in_order() {
        let backend = backend();
        let runner = MockRunner::new();
        let plan = vec![
            PlannedStep::required(RunCommand::new("one", "echo 1")),
            PlannedStep::required(RunCommand::new("two", "echo 2")),
            PlannedStep::required(RunCommand::new("three", "echo 3")),
        ];

        let report = Sequencer::new(&backend, &runner).run(&plan).unwrap();
        let names: Vec<_> = report.entries().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(runner.commands(), vec!["echo 1", "echo 2", "echo 3"]);
    }

    #[test]
    fn halts_on_required_failure() {
        let backend = backend();
        let runner = MockRunner::new().fail_on("echo 2", 1);
        let plan = vec![
            PlannedStep::required(RunCommand::new("one", "echo 1")),
            PlannedStep::required(RunCommand::new("two", "echo 2")),
            PlannedStep::required(RunCommand::new("three", "echo 3")),
        ];

        let halted = Sequencer::new(&backend, &runner).run(&plan).unwrap_err();
        assert_eq!(halted.report.len(), 2);
        assert!(halted.report.entries()[1].outcome.is_failed());
        assert!(matches!(halted.error, StepError::CommandFailed { .. }));
        assert_eq!(runner.count_matching("echo 3"), 0);
    }

    #[test]
    fn best_effort_failure_continues() {
        let backend = backend();
        let runner = MockRunner::new().fail_on("echo 2", 1);
        let plan = vec![
            PlannedStep::required(RunCommand::new("one", "echo 1")),
            PlannedStep::best_effort(RunCommand::new("two", "echo 2")),
            PlannedStep::required(RunCommand::new("three", "echo 3")),
        ];

        let report = Sequencer::new(&backend, &runner).run(&plan).unwrap();
        assert_eq!(report.len(), 3);
        assert!(report.entries()[1].outcome.is_failed());
        assert_eq!(report.entries()[2].outcome, StepOutcome::Succeeded);
    }

    #[test]
    fn progress_events_follow_outcomes() {
        let backend = backend();
        let runner = MockRunner::new();
        let plan = vec![
            PlannedStep::required(RunCommand::new("done", "x").with_check(
                CompletedCheck::CommandSucceeds {
                    command: "true".into(),
                },
            )),
            PlannedStep::required(RunCommand::new("todo", "y")),
        ];

        let mut events = Vec::new();
        Sequencer::new(&backend, &runner)
            .run_with_progress(&plan, |event| {
                events.push(match event {
                    RunProgress::StepStarting { name, index, total } => {
                        format!("start {} {}/{}", name, index, total)
                    }
                    RunProgress::StepSkipped { name, .. } => format!("skip {}", name),
                    RunProgress::StepFinished { record } => {
                        format!("finish {} {}", record.name, record.outcome)
                    }
                })
            })
            .unwrap();

        assert_eq!(
            events,
            vec![
                "start done 0/2",
                "skip done",
                "start todo 1/2",
                "finish todo succeeded",
            ]
        );
    }

    #[test]
    fn timeout_reaches_commands() {
        use crate::shell::{CommandOptions, CommandResult, CommandRunner};
        use std::sync::Mutex;

        struct Recording(Mutex<Vec<Option<Duration>>>);
        impl CommandRunner for Recording {
            fn run(&self, _: &str, options: &CommandOptions) -> std::io::Result<CommandResult> {
                self.0.lock().unwrap().push(options.timeout);
                Ok(CommandResult::success(String::new(), String::new(), Duration::ZERO))
            }
        }

        let backend = backend();
        let runner = Recording(Mutex::new(Vec::new()));
        let plan = vec![PlannedStep::required(RunCommand::new("one", "echo 1"))];
        Sequencer::new(&backend, &runner)
            .with_timeout(Some(Duration::from_secs(5)))
            .run(&plan)
            .unwrap();

        assert_eq!(*runner.0.lock().unwrap(), vec![Some(Duration::from_secs(5))]);
    }
}
