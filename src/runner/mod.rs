//! Sequencing of provisioning steps and the resulting reports.

pub mod last_run;
pub mod report;
pub mod sequencer;

pub use last_run::{LastRun, LAST_RUN_FILE};
pub use report::{format_duration, RunReport, StepOutcome, StepRecord};
pub use sequencer::{RunProgress, Sequencer};
