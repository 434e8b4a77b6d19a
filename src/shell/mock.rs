//! Mock command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning anything.
//! Every command line is recorded, and responses are chosen by the first
//! registered rule whose pattern is a substring of the command. Commands
//! with no matching rule succeed with empty output.
//!
//! # Example
//!
//! ```
//! use termstrap::shell::{CommandOptions, CommandRunner, MockRunner};
//!
//! let runner = MockRunner::new()
//!     .respond("git --version", "git version 2.45.0")
//!     .fail_on("command -v sudo", 1);
//!
//! assert!(runner.check("pkg update -y"));
//! assert!(!runner.check("command -v sudo"));
//! assert_eq!(runner.commands().len(), 2);
//! ```

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use super::command::{CommandOptions, CommandResult, CommandRunner};

type Responder = Box<dyn Fn(&str) -> CommandResult + Send + Sync>;

/// Scriptable [`CommandRunner`] that records every command it is asked to run.
#[derive(Default)]
pub struct MockRunner {
    rules: Vec<(String, Responder)>,
    commands: Mutex<Vec<String>>,
}

impl MockRunner {
    /// Create a runner where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `pattern` succeed and print `stdout`.
    pub fn respond(self, pattern: &str, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.on(pattern, move |_| {
            CommandResult::success(stdout.clone(), String::new(), Duration::ZERO)
        })
    }

    /// Commands containing `pattern` exit with `code`.
    pub fn fail_on(self, pattern: &str, code: i32) -> Self {
        self.on(pattern, move |_| {
            CommandResult::failure(Some(code), String::new(), String::new(), Duration::ZERO)
        })
    }

    /// Commands containing `pattern` are answered by `responder`.
    ///
    /// The responder may perform side effects (e.g. create the file a real
    /// installer would have created).
    pub fn on<F>(mut self, pattern: &str, responder: F) -> Self
    where
        F: Fn(&str) -> CommandResult + Send + Sync + 'static,
    {
        self.rules.push((pattern.to_string(), Box::new(responder)));
        self
    }

    /// All commands run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded commands containing `pattern`.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.contains(pattern))
            .count()
    }
}

impl std::fmt::Debug for MockRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRunner")
            .field("rules", &self.rules.len())
            .field("commands", &self.commands())
            .finish()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &str, _options: &CommandOptions) -> io::Result<CommandResult> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.to_string());
        }

        let result = self
            .rules
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, responder)| responder(command))
            .unwrap_or_else(|| CommandResult::success(String::new(), String::new(), Duration::ZERO));

        Ok(result)
    }
}
