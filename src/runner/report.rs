//! Run reports.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Already satisfied; nothing was run.
    Skipped { reason: String },
    /// Ran to completion.
    Succeeded,
    /// Ran and failed.
    Failed { reason: String },
}

impl StepOutcome {
    /// Get a display character for this outcome.
    pub fn display_char(&self) -> char {
        match self {
            StepOutcome::Skipped { .. } => '⊘',
            StepOutcome::Succeeded => '✓',
            StepOutcome::Failed { .. } => '✗',
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Skipped { .. } => write!(f, "skipped"),
            StepOutcome::Succeeded => write!(f, "succeeded"),
            StepOutcome::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// One entry of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name.
    pub name: String,

    /// What happened.
    #[serde(flatten)]
    pub outcome: StepOutcome,

    /// Whether failure was tolerated.
    #[serde(default)]
    pub best_effort: bool,

    /// Wall-clock time spent, including the completed check.
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl StepRecord {
    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let c = self.outcome.display_char();
        match &self.outcome {
            StepOutcome::Succeeded => {
                format!("{} {} ({})", c, self.name, format_duration(self.duration))
            }
            StepOutcome::Skipped { reason } => format!("{} {} ({})", c, self.name, reason),
            StepOutcome::Failed { reason } if self.best_effort => {
                format!("{} {} - {} (ignored)", c, self.name, reason)
            }
            StepOutcome::Failed { reason } => format!("{} {} - {}", c, self.name, reason),
        }
    }
}

/// Ordered outcomes of a run, appended as steps finish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    entries: Vec<StepRecord>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, record: StepRecord) {
        self.entries.push(record);
    }

    /// Records in execution order.
    pub fn entries(&self) -> &[StepRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records with `outcome`'s variant.
    pub fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.entries.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Whether any required step failed.
    pub fn has_required_failure(&self) -> bool {
        self.entries
            .iter()
            .any(|r| r.outcome.is_failed() && !r.best_effort)
    }

    /// Total time across all records.
    pub fn total_duration(&self) -> Duration {
        self.entries.iter().map(|r| r.duration).sum()
    }

    /// "3 succeeded, 1 skipped, 0 failed".
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} skipped, {} failed",
            self.count(|o| matches!(o, StepOutcome::Succeeded)),
            self.count(|o| matches!(o, StepOutcome::Skipped { .. })),
            self.count(StepOutcome::is_failed),
        )
    }
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
