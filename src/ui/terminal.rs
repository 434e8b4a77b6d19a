//! Terminal UI.

use console::Term;
use std::io::Write;

use super::{OutputMode, ProgressSpinner, SpinnerHandle, Table, TermstrapTheme, UserInterface};

/// Writes status to stdout and errors to stderr.
pub struct TerminalUI {
    term: Term,
    err: Term,
    theme: TermstrapTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, colors: bool) -> Self {
        Self {
            term: Term::stdout(),
            err: Term::stderr(),
            theme: TermstrapTheme::for_colors(colors),
            mode,
        }
    }

    /// Theme in use, for callers that style their own lines.
    pub fn theme(&self) -> &TermstrapTheme {
        &self.theme
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() && self.term.is_term() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(LineSpinner {
                term: self.term.clone(),
                theme: self.theme.clone(),
                visible: self.mode.shows_status(),
            })
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_field(&mut self, key: &str, value: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "  {}", self.theme.format_field(key, value)).ok();
        }
    }

    fn show_table(&mut self, table: &Table) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", table.render()).ok();
        }
    }

    fn show_error_block(&mut self, command: &str, detail: &str) {
        let b = &self.theme.border;
        writeln!(
            self.err,
            "    {} {}",
            b.apply_to("┌─"),
            b.apply_to("Command ──────────────────────────")
        )
        .ok();
        writeln!(self.err, "    {} {}", b.apply_to("│"), command).ok();
        if !detail.is_empty() {
            writeln!(
                self.err,
                "    {} {}",
                b.apply_to("├─"),
                b.apply_to("Details ──────────────────────────")
            )
            .ok();
            for line in detail.lines() {
                writeln!(self.err, "    {} {}", b.apply_to("│"), line).ok();
            }
        }
        writeln!(
            self.err,
            "    {}",
            b.apply_to("└────────────────────────────────────")
        )
        .ok();
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Stand-in for a spinner when stdout is not a terminal: prints only the
/// final status line.
struct LineSpinner {
    term: Term,
    theme: TermstrapTheme,
    visible: bool,
}

impl LineSpinner {
    fn emit(&mut self, line: String) {
        if self.visible {
            writeln!(self.term, "{}", line).ok();
        }
    }
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.emit(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.emit(line);
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.emit(line);
    }
}

/// Create the terminal UI for the given mode.
pub fn create_ui(mode: OutputMode, colors: bool) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode, colors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_ui_reports_mode() {
        let ui = create_ui(OutputMode::Quiet, false);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn silent_ui_accepts_all_calls() {
        let mut ui = TerminalUI::new(OutputMode::Silent, false);
        ui.show_header("termstrap");
        ui.message("hidden");
        ui.show_field("Environment", "termux");
        ui.show_table(&Table::new(&["Tool"]));
        let mut spinner = ui.start_spinner("install packages");
        spinner.finish_skipped("install packages");
    }
}
