//! Record of the most recent run.
//!
//! Written to `last_run.json` in the state directory after every run,
//! whether it finished or halted.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentKind;

use super::report::RunReport;

/// File name inside the state directory.
pub const LAST_RUN_FILE: &str = "last_run.json";

/// Persisted summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    /// Schema version for migration.
    pub version: u32,

    /// Crate version that produced this record.
    pub termstrap_version: String,

    /// Environment the run was classified as.
    pub environment: EnvironmentKind,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Whether a required step stopped the run.
    pub halted: bool,

    /// Step outcomes in execution order.
    pub report: RunReport,
}

impl LastRun {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(
        environment: EnvironmentKind,
        started_at: DateTime<Utc>,
        report: RunReport,
        halted: bool,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            termstrap_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            started_at,
            finished_at: Utc::now(),
            halted,
            report,
        }
    }

    /// Path of the record under `state_dir`.
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(LAST_RUN_FILE)
    }

    /// Load the previous record, if any.
    pub fn load(state_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(state_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt run record {}", path.display()))?;
        Ok(Some(record))
    }

    /// Save using write-to-temp-then-rename.
    pub fn save(&self, state_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(state_dir)
            .with_context(|| format!("Failed to create state directory {}", state_dir.display()))?;
        let path = Self::path(state_dir);
        let content = serde_json::to_string_pretty(self).context("Failed to serialize run record")?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{StepOutcome, StepRecord};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let mut report = RunReport::new();
        report.push(StepRecord {
            name: "install packages".into(),
            outcome: StepOutcome::Succeeded,
            best_effort: false,
            duration: Duration::from_millis(1200),
        });
        let record = LastRun::new(EnvironmentKind::Termux, Utc::now(), report, false);

        let path = record.save(temp.path()).unwrap();
        assert_eq!(path, temp.path().join(LAST_RUN_FILE));
        assert!(!temp.path().join("last_run.json.tmp").exists());

        let loaded = LastRun::load(temp.path()).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn environment_is_snake_case_in_json() {
        let temp = TempDir::new().unwrap();
        LastRun::new(EnvironmentKind::UbuntuProot, Utc::now(), RunReport::new(), true)
            .save(temp.path())
            .unwrap();
        let raw = fs::read_to_string(temp.path().join(LAST_RUN_FILE)).unwrap();
        assert!(raw.contains("\"ubuntu_proot\""));
        assert!(raw.contains("\"halted\": true"));
    }

    #[test]
    fn corrupt_record_names_the_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(LAST_RUN_FILE), "{ not json").unwrap();

        let err = LastRun::load(temp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Corrupt run record"));
        assert!(format!("{:#}", err).contains(LAST_RUN_FILE));
    }

    #[test]
    fn unwritable_state_dir_is_reported_with_context() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("state");
        fs::write(&blocker, "").unwrap();

        let err = LastRun::new(EnvironmentKind::Termux, Utc::now(), RunReport::new(), false)
            .save(&blocker.join("termstrap"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to create state directory"));
    }

    #[test]
    fn missing_record_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(LastRun::load(temp.path()).unwrap().is_none());
    }
}
