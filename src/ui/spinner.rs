//! Progress spinners and live command output.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::shell::{OutputCallback, OutputLine};

use super::theme::TermstrapTheme;
use super::SpinnerHandle;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const MAX_LIVE_LINE: usize = 72;

/// A progress spinner for long-running operations.
pub struct ProgressSpinner {
    bar: ProgressBar,
    indent: usize,
    theme: TermstrapTheme,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str, theme: TermstrapTheme) -> Self {
        Self::with_indent(message, 0, theme)
    }

    /// Create a new spinner with indentation.
    pub fn with_indent(message: &str, indent: usize, theme: TermstrapTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        let prefix = " ".repeat(indent);
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars(TICK_CHARS)
            .template(&format!("{}{{spinner:.magenta}} {{msg}}", prefix))
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self { bar, indent, theme }
    }

    /// A spinner that draws nothing (silent mode, non-TTY).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            indent: 0,
            theme: TermstrapTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            self.bar.set_style(style);
        }
        let prefix = " ".repeat(self.indent);
        self.bar.finish_with_message(format!("{}{}", prefix, line));
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.finish_with(line);
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        Some(self.bar.clone())
    }
}

struct LiveTarget {
    bar: ProgressBar,
    base_message: String,
    lines: VecDeque<String>,
}

/// Routes streamed command output to whichever spinner is current.
///
/// The shell runner takes one output callback for its whole lifetime while
/// spinners come and go per step, so the callback writes through a shared
/// slot that the caller re-points with [`attach`](Self::attach).
#[derive(Clone)]
pub struct LiveOutput {
    target: Arc<Mutex<Option<LiveTarget>>>,
    indent: usize,
    max_lines: usize,
    echo: bool,
    theme: TermstrapTheme,
}

impl LiveOutput {
    /// Show the last `max_lines` lines beneath the spinner.
    pub fn new(indent: usize, max_lines: usize, theme: TermstrapTheme) -> Self {
        Self {
            target: Arc::new(Mutex::new(None)),
            indent,
            max_lines,
            echo: false,
            theme,
        }
    }

    /// Print every line above the spinner instead of a rolling tail.
    pub fn echo_all(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Direct output at `bar`, whose resting message is `base_message`.
    pub fn attach(&self, bar: ProgressBar, base_message: &str) {
        if let Ok(mut slot) = self.target.lock() {
            *slot = Some(LiveTarget {
                bar,
                base_message: base_message.to_string(),
                lines: VecDeque::new(),
            });
        }
    }

    /// Stop forwarding output.
    pub fn detach(&self) {
        if let Ok(mut slot) = self.target.lock() {
            *slot = None;
        }
    }

    /// Callback to hand to the shell runner.
    pub fn callback(&self) -> OutputCallback {
        let live = self.clone();
        Arc::new(move |line: &OutputLine| live.push(line))
    }

    fn push(&self, line: &OutputLine) {
        let text = match line {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s.trim_end(),
        };
        if text.is_empty() {
            return;
        }

        let Ok(mut slot) = self.target.lock() else {
            return;
        };
        let Some(target) = slot.as_mut() else {
            return;
        };

        let prefix = " ".repeat(self.indent);
        if self.echo {
            target
                .bar
                .println(format!("{}{}", prefix, self.theme.dim.apply_to(text)));
            return;
        }

        target.lines.push_back(truncate_line(text));
        while target.lines.len() > self.max_lines {
            target.lines.pop_front();
        }

        let mut msg = target.base_message.clone();
        for line in &target.lines {
            msg.push('\n');
            msg.push_str(&prefix);
            msg.push_str(&self.theme.dim.apply_to(format!("» {}", line)).to_string());
        }
        target.bar.set_message(msg);
    }
}

fn truncate_line(text: &str) -> String {
    if text.chars().count() > MAX_LIVE_LINE {
        let head: String = text.chars().take(MAX_LIVE_LINE - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stdout(s: &str) -> OutputLine {
        OutputLine::Stdout(s.to_string())
    }

    #[test]
    fn spinner_finishes() {
        let mut spinner = ProgressSpinner::new("Testing...", TermstrapTheme::plain());
        spinner.set_message("Updated");
        spinner.finish_success("Done");

        let mut spinner = ProgressSpinner::new("Testing...", TermstrapTheme::plain());
        spinner.finish_error("Failed");
    }

    #[test]
    fn finish_skipped_sets_final_message() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.finish_skipped("install packages");
        let bar = spinner.progress_bar().unwrap();
        assert_eq!(bar.message(), "⊘ install packages");
        assert!(bar.is_finished());
    }

    #[test]
    fn live_output_keeps_a_rolling_tail() {
        let live = LiveOutput::new(4, 2, TermstrapTheme::plain());
        let bar = ProgressBar::hidden();
        live.attach(bar.clone(), "Running...");
        let callback = live.callback();

        callback(&stdout("line 1"));
        callback(&OutputLine::Stderr("line 2".to_string()));
        assert!(bar.message().contains("line 1"));
        assert!(bar.message().contains("line 2"));

        callback(&stdout("line 3"));
        let msg = bar.message();
        assert!(msg.starts_with("Running..."));
        assert!(!msg.contains("line 1"));
        assert!(msg.contains("line 3"));
    }

    #[test]
    fn live_output_skips_empty_lines() {
        let live = LiveOutput::new(4, 2, TermstrapTheme::plain());
        let bar = ProgressBar::hidden();
        live.attach(bar.clone(), "Running...");
        let callback = live.callback();

        callback(&stdout(""));
        callback(&stdout("real output"));
        assert_eq!(bar.message().matches('\n').count(), 1);
    }

    #[test]
    fn live_output_truncates_long_lines() {
        let live = LiveOutput::new(0, 2, TermstrapTheme::plain());
        let bar = ProgressBar::hidden();
        live.attach(bar.clone(), "Running...");

        live.callback()(&stdout(&"é".repeat(100)));
        let msg = bar.message();
        assert!(msg.ends_with("..."));
        assert!(!msg.contains(&"é".repeat(100)));
    }

    #[test]
    fn detached_output_is_dropped() {
        let live = LiveOutput::new(0, 2, TermstrapTheme::plain());
        let bar = ProgressBar::hidden();
        live.attach(bar.clone(), "Running...");
        live.detach();

        live.callback()(&stdout("late line"));
        assert_eq!(bar.message(), "Running...");
    }

    #[test]
    fn reattach_starts_a_fresh_tail() {
        let live = LiveOutput::new(0, 3, TermstrapTheme::plain());
        let first = ProgressBar::hidden();
        live.attach(first.clone(), "first");
        live.callback()(&stdout("from first"));

        let second = ProgressBar::hidden();
        live.attach(second.clone(), "second");
        live.callback()(&stdout("from second"));

        assert!(!second.message().contains("from first"));
        assert!(second.message().contains("from second"));
    }
}
