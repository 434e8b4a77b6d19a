//! termstrap CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use termstrap::cli::{Cli, CommandDispatcher};
use termstrap::config::HostPaths;
use termstrap::shell::RunLog;
use termstrap::ui::{create_ui, should_use_colors, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// The terminal gets warnings by default (`RUST_LOG` overrides, `--debug`
/// forces debug) so spinners stay readable. When a run log is open, info
/// level events are also appended to its stdout file without ANSI codes.
fn init_tracing(debug: bool, run_log: Option<&RunLog>) {
    let terminal_filter = if debug {
        EnvFilter::new("termstrap=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("termstrap=warn"))
    };
    let file_filter = EnvFilter::new(if debug {
        "termstrap=debug"
    } else {
        "termstrap=info"
    });

    let file_layer = run_log
        .and_then(|log| log.tracing_writer().ok())
        .map(|writer| {
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer)
                .with_filter(file_filter)
        });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(terminal_filter),
        )
        .with(file_layer)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let colors = should_use_colors(cli.no_color);
    console::set_colors_enabled(colors);
    console::set_colors_enabled_stderr(colors);
    let mut ui = create_ui(OutputMode::from_flags(cli.verbose, cli.quiet), colors);

    let paths = match HostPaths::from_env() {
        Ok(paths) => paths,
        Err(e) => {
            init_tracing(cli.debug, None);
            ui.error(&format!("Error: {}", e));
            return ExitCode::from(2);
        }
    };

    let run_log = if cli.is_run() {
        match RunLog::open(&paths.state_dir()) {
            Ok(log) => Some(Arc::new(log)),
            Err(e) => {
                init_tracing(cli.debug, None);
                ui.error(&format!(
                    "Error: cannot open run log in {}: {}",
                    paths.state_dir().display(),
                    e
                ));
                return ExitCode::from(1);
            }
        }
    } else {
        None
    };

    init_tracing(cli.debug, run_log.as_deref());
    tracing::debug!("termstrap starting with args: {:?}", cli);

    let dispatcher = CommandDispatcher::new(paths)
        .with_config(cli.config.clone())
        .with_run_log(run_log)
        .with_colors(colors);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(e.exit_code())
        }
    }
}
