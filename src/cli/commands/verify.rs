//! Verify command implementation.
//!
//! `termstrap verify` reports the configured tools without provisioning
//! anything. Missing tools are listed, never treated as a failure.

use std::path::PathBuf;

use crate::config::{load_config, HostPaths};
use crate::error::Result;
use crate::shell::{CommandRunner, ShellRunner};
use crate::ui::{Table, UserInterface};
use crate::verify::{ToolReport, VerificationReporter};

use super::dispatcher::{Command, CommandResult};

/// The verify command implementation.
pub struct VerifyCommand {
    paths: HostPaths,
    config: Option<PathBuf>,
}

impl VerifyCommand {
    pub fn new(paths: HostPaths, config: Option<PathBuf>) -> Self {
        Self { paths, config }
    }
}

impl Command for VerifyCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (config, _) = load_config(self.config.as_deref(), &self.paths)?;
        ui.show_header("termstrap verify");
        show_verification(&ShellRunner::new(), &config.verify, ui);
        Ok(CommandResult::success())
    }
}

/// Check `tools` and render the results.
pub(super) fn show_verification(
    runner: &dyn CommandRunner,
    tools: &[String],
    ui: &mut dyn UserInterface,
) -> Vec<ToolReport> {
    let reports = VerificationReporter::new(runner).verify(tools);
    show_reports(&reports, ui);
    reports
}

fn show_reports(reports: &[ToolReport], ui: &mut dyn UserInterface) {
    if reports.is_empty() {
        ui.message("No tools configured for verification");
        return;
    }

    ui.show_table(&verification_table(reports));

    let absent: Vec<&str> = reports
        .iter()
        .filter(|r| !r.is_present())
        .map(|r| r.tool.as_str())
        .collect();
    if absent.is_empty() {
        ui.success("All expected tools are installed");
    } else {
        ui.warning(&format!("Not found on PATH: {}", absent.join(", ")));
    }
}

fn verification_table(reports: &[ToolReport]) -> Table {
    let mut table = Table::new(&["Tool", "Version", "Status"]);
    for report in reports {
        let status = if report.is_present() { "✓" } else { "✗" };
        table.add_row(&[report.tool.as_str(), report.version_display(), status]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use crate::verify::ToolStatus;

    fn report(tool: &str, status: ToolStatus) -> ToolReport {
        ToolReport {
            tool: tool.into(),
            status,
        }
    }

    #[test]
    fn table_lists_every_tool() {
        let reports = vec![
            report(
                "git",
                ToolStatus::Found {
                    path: PathBuf::from("/usr/bin/git"),
                    version: Some("2.45.0".into()),
                },
            ),
            report("nvim", ToolStatus::Absent),
        ];

        let rendered = verification_table(&reports).render();
        assert!(rendered.contains("2.45.0"));
        assert!(rendered.contains("absent"));
    }

    #[test]
    fn absent_tools_warn_but_do_not_error() {
        let reports = vec![report("nvim", ToolStatus::Absent)];
        let mut ui = MockUI::new();
        show_reports(&reports, &mut ui);

        assert_eq!(ui.tables().len(), 1);
        assert!(ui.warnings()[0].contains("nvim"));
        assert!(ui.errors().is_empty());
    }

    #[test]
    fn all_present_is_a_success_line() {
        let reports = vec![report(
            "curl",
            ToolStatus::Found {
                path: PathBuf::from("/usr/bin/curl"),
                version: None,
            },
        )];
        let mut ui = MockUI::new();
        show_reports(&reports, &mut ui);
        assert_eq!(ui.successes(), ["All expected tools are installed"]);
    }
}
