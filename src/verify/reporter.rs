//! Post-run tool verification.
//!
//! Advisory only: every expected tool is checked and reported, and a
//! missing tool never turns into an error.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::shell::{shell_quote, CommandOptions, CommandRunner};

use super::probe::{parse_system_path, resolve_tool_path};

/// Pulls "2.45.0", "0.10.0" or "9.6p1" out of a version banner.
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)+[0-9A-Za-z]*").expect("VERSION_REGEX must compile")
});

/// What verification found for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolStatus {
    /// On PATH; `version` is None when the version query failed.
    Found {
        path: PathBuf,
        version: Option<String>,
    },
    /// Not on PATH.
    Absent,
}

/// One verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolReport {
    pub tool: String,
    #[serde(flatten)]
    pub status: ToolStatus,
}

impl ToolReport {
    pub fn is_present(&self) -> bool {
        matches!(self.status, ToolStatus::Found { .. })
    }

    /// Version string, "unknown", or "absent".
    pub fn version_display(&self) -> &str {
        match &self.status {
            ToolStatus::Found {
                version: Some(v), ..
            } => v,
            ToolStatus::Found { version: None, .. } => "unknown",
            ToolStatus::Absent => "absent",
        }
    }
}

/// Checks expected tools for presence and version.
pub struct VerificationReporter<'a> {
    runner: &'a dyn CommandRunner,
    path_entries: Vec<PathBuf>,
}

impl<'a> VerificationReporter<'a> {
    /// Search the process PATH.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self::with_path(runner, parse_system_path())
    }

    /// Search the given PATH entries.
    pub fn with_path(runner: &'a dyn CommandRunner, path_entries: Vec<PathBuf>) -> Self {
        Self {
            runner,
            path_entries,
        }
    }

    /// Check each tool, in order.
    pub fn verify<S: AsRef<str>>(&self, tools: &[S]) -> Vec<ToolReport> {
        tools.iter().map(|t| self.verify_tool(t.as_ref())).collect()
    }

    fn verify_tool(&self, tool: &str) -> ToolReport {
        let Some(path) = resolve_tool_path(tool, &self.path_entries) else {
            warn!("{} not found on PATH", tool);
            return ToolReport {
                tool: tool.to_string(),
                status: ToolStatus::Absent,
            };
        };

        let command = format!(
            "{} {}",
            shell_quote(&path.to_string_lossy()),
            version_flag(tool)
        );
        let version = match self.runner.run(&command, &CommandOptions::default()) {
            Ok(result) if result.success => result.first_line().map(extract_version),
            Ok(result) => {
                debug!("{} version query exited {:?}", tool, result.exit_code);
                None
            }
            Err(e) => {
                debug!("{} version query failed: {}", tool, e);
                None
            }
        };

        ToolReport {
            tool: tool.to_string(),
            status: ToolStatus::Found { path, version },
        }
    }
}

fn version_flag(tool: &str) -> &'static str {
    match tool {
        "ssh" => "-V",
        _ => "--version",
    }
}

/// Version number from a banner line, or the whole trimmed line.
pub fn extract_version(line: &str) -> String {
    VERSION_REGEX
        .find(line)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| line.trim().to_string())
}
