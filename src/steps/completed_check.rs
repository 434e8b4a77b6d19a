//! Idempotency checks.
//!
//! A completed check decides whether a step's effect is already present on
//! the host, in which case the step is skipped without side effects.

use std::fs;
use std::path::PathBuf;

use crate::shell::CommandRunner;

/// Declarative "is this already done" predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletedCheck {
    /// A file or directory exists.
    FileExists { path: PathBuf },

    /// A file contains `line` as an exact line (surrounding whitespace ignored).
    LineInFile { path: PathBuf, line: String },

    /// A file exists with exactly `contents`.
    FileContentEquals { path: PathBuf, contents: String },

    /// A command exits 0.
    CommandSucceeds { command: String },

    /// A command exits 0 and its trimmed stdout equals `expected`.
    CommandOutputEquals { command: String, expected: String },

    /// All checks must pass.
    All { checks: Vec<CompletedCheck> },

    /// Any check passing is sufficient.
    Any { checks: Vec<CompletedCheck> },
}

/// Result of running a completed check.
///
/// The `description` is user-visible: it appears in skip messages and in
/// the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Whether the check passed (step is complete).
    pub complete: bool,

    /// Description of what was checked.
    pub description: String,

    /// Details about the check result.
    pub details: Option<String>,
}

impl CheckResult {
    /// Create a complete result.
    pub fn complete(description: impl Into<String>) -> Self {
        Self {
            complete: true,
            description: description.into(),
            details: None,
        }
    }

    /// Create an incomplete result.
    pub fn incomplete(description: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            complete: false,
            description: description.into(),
            details: Some(details.into()),
        }
    }

    /// Description with prefixes like "File exists: " stripped.
    pub fn short_description(&self) -> &str {
        const PREFIXES: &[&str] = &[
            "Command succeeded: ",
            "Command failed: ",
            "File exists: ",
            "File missing: ",
            "Line present: ",
            "Line missing: ",
            "Up to date: ",
            "Check passed: ",
        ];
        for prefix in PREFIXES {
            if let Some(rest) = self.description.strip_prefix(prefix) {
                return rest;
            }
        }
        &self.description
    }
}

/// Run a completed check.
pub fn run_check(check: &CompletedCheck, runner: &dyn CommandRunner) -> CheckResult {
    match check {
        CompletedCheck::FileExists { path } => {
            if path.exists() {
                CheckResult::complete(format!("File exists: {}", path.display()))
            } else {
                CheckResult::incomplete(
                    format!("File missing: {}", path.display()),
                    format!("Expected at: {}", path.display()),
                )
            }
        }
        CompletedCheck::LineInFile { path, line } => check_line_in_file(path, line),
        CompletedCheck::FileContentEquals { path, contents } => {
            check_file_content(path, contents)
        }
        CompletedCheck::CommandSucceeds { command } => {
            if runner.check(command) {
                CheckResult::complete(format!("Command succeeded: {}", truncate(command, 50)))
            } else {
                CheckResult::incomplete(
                    format!("Command failed: {}", truncate(command, 50)),
                    "Exit code was non-zero",
                )
            }
        }
        CompletedCheck::CommandOutputEquals { command, expected } => {
            match runner.capture(command) {
                Some(out) if out.trim() == expected => {
                    CheckResult::complete(format!("Up to date: {}", truncate(command, 50)))
                }
                Some(out) => CheckResult::incomplete(
                    format!("Output differs: {}", truncate(command, 50)),
                    format!("expected '{}', got '{}'", expected, out.trim()),
                ),
                None => CheckResult::incomplete(
                    format!("Command failed: {}", truncate(command, 50)),
                    "Exit code was non-zero",
                ),
            }
        }
        CompletedCheck::All { checks } => check_all(checks, runner),
        CompletedCheck::Any { checks } => check_any(checks, runner),
    }
}

fn check_line_in_file(path: &PathBuf, line: &str) -> CheckResult {
    let wanted = line.trim();
    let present = fs::read_to_string(path)
        .map(|content| content.lines().any(|l| l.trim() == wanted))
        .unwrap_or(false);

    if present {
        CheckResult::complete(format!("Line present: {}", path.display()))
    } else {
        CheckResult::incomplete(
            format!("Line missing: {}", path.display()),
            format!("'{}' not found", truncate(wanted, 50)),
        )
    }
}

fn check_file_content(path: &PathBuf, contents: &str) -> CheckResult {
    match fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => {
            CheckResult::complete(format!("Up to date: {}", path.display()))
        }
        Ok(_) => CheckResult::incomplete(
            format!("Contents differ: {}", path.display()),
            "File will be rewritten",
        ),
        Err(_) => CheckResult::incomplete(
            format!("File missing: {}", path.display()),
            format!("Expected at: {}", path.display()),
        ),
    }
}

fn check_all(checks: &[CompletedCheck], runner: &dyn CommandRunner) -> CheckResult {
    let results: Vec<_> = checks.iter().map(|c| run_check(c, runner)).collect();

    if results.iter().all(|r| r.complete) {
        CheckResult::complete(format!("All {} checks passed", checks.len()))
    } else {
        let failed: Vec<_> = results
            .iter()
            .filter(|r| !r.complete)
            .map(|r| r.description.clone())
            .collect();

        CheckResult::incomplete(
            format!("{}/{} checks failed", failed.len(), checks.len()),
            failed.join("; "),
        )
    }
}

fn check_any(checks: &[CompletedCheck], runner: &dyn CommandRunner) -> CheckResult {
    let results: Vec<_> = checks.iter().map(|c| run_check(c, runner)).collect();

    if let Some(passed) = results.iter().find(|r| r.complete) {
        CheckResult::complete(format!("Check passed: {}", passed.description))
    } else {
        CheckResult::incomplete(
            format!("None of {} checks passed", checks.len()),
            results
                .iter()
                .map(|r| r.description.clone())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::MockRunner;
    use tempfile::TempDir;

    #[test]
    fn file_exists_returns_complete_when_exists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plug.vim");
        fs::write(&path, "x").unwrap();

        let result = run_check(&CompletedCheck::FileExists { path }, &MockRunner::new());
        assert!(result.complete);
        assert!(result.short_description().ends_with("plug.vim"));
    }

    #[test]
    fn file_exists_returns_incomplete_when_missing() {
        let temp = TempDir::new().unwrap();
        let check = CompletedCheck::FileExists {
            path: temp.path().join("missing"),
        };
        let result = run_check(&check, &MockRunner::new());
        assert!(!result.complete);
        assert!(result.details.unwrap().contains("missing"));
    }

    #[test]
    fn line_in_file_matches_exact_lines_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".zshrc");
        fs::write(&path, "export EDITOR=nvim\n# alias vim=nvim\n").unwrap();

        let present = CompletedCheck::LineInFile {
            path: path.clone(),
            line: "export EDITOR=nvim".into(),
        };
        let commented = CompletedCheck::LineInFile {
            path,
            line: "alias vim=nvim".into(),
        };
        let runner = MockRunner::new();
        assert!(run_check(&present, &runner).complete);
        assert!(!run_check(&commented, &runner).complete);
    }

    #[test]
    fn line_in_missing_file_is_incomplete() {
        let temp = TempDir::new().unwrap();
        let check = CompletedCheck::LineInFile {
            path: temp.path().join("absent"),
            line: "x".into(),
        };
        assert!(!run_check(&check, &MockRunner::new()).complete);
    }

    #[test]
    fn file_content_equals_compares_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("init.vim");
        fs::write(&path, "set number\n").unwrap();

        let same = CompletedCheck::FileContentEquals {
            path: path.clone(),
            contents: "set number\n".into(),
        };
        let different = CompletedCheck::FileContentEquals {
            path,
            contents: "set number".into(),
        };
        let runner = MockRunner::new();
        assert!(run_check(&same, &runner).complete);
        assert!(!run_check(&different, &runner).complete);
    }

    #[test]
    fn command_succeeds_uses_runner() {
        let runner = MockRunner::new().fail_on("dpkg -s zsh", 1);
        let ok = CompletedCheck::CommandSucceeds {
            command: "dpkg -s git".into(),
        };
        let missing = CompletedCheck::CommandSucceeds {
            command: "dpkg -s zsh".into(),
        };
        assert!(run_check(&ok, &runner).complete);
        assert!(!run_check(&missing, &runner).complete);
    }

    #[test]
    fn command_output_equals_trims_output() {
        let runner = MockRunner::new().respond("user.name", "Ada Lovelace\n");
        let matching = CompletedCheck::CommandOutputEquals {
            command: "git config --global user.name".into(),
            expected: "Ada Lovelace".into(),
        };
        let other = CompletedCheck::CommandOutputEquals {
            command: "git config --global user.name".into(),
            expected: "Grace Hopper".into(),
        };
        assert!(run_check(&matching, &runner).complete);
        let result = run_check(&other, &runner);
        assert!(!result.complete);
        assert!(result.details.unwrap().contains("Ada Lovelace"));
    }

    #[test]
    fn all_requires_every_check() {
        let runner = MockRunner::new().fail_on("false", 1);
        let check = CompletedCheck::All {
            checks: vec![
                CompletedCheck::CommandSucceeds {
                    command: "true".into(),
                },
                CompletedCheck::CommandSucceeds {
                    command: "false".into(),
                },
            ],
        };
        let result = run_check(&check, &runner);
        assert!(!result.complete);
        assert_eq!(result.description, "1/2 checks failed");
    }

    #[test]
    fn any_passes_on_first_success() {
        let runner = MockRunner::new().fail_on("false", 1);
        let check = CompletedCheck::Any {
            checks: vec![
                CompletedCheck::CommandSucceeds {
                    command: "false".into(),
                },
                CompletedCheck::CommandSucceeds {
                    command: "true".into(),
                },
            ],
        };
        assert!(run_check(&check, &runner).complete);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(60);
        let short = truncate(&long, 10);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 10);
    }
}
