//! Append-only run logs.
//!
//! Every run appends to two files in the state directory: one for the
//! standard output of external commands (plus structured progress events)
//! and one for their standard error. The files are opened once, in append
//! mode, and stay open for the whole run so a fatal failure still leaves
//! the partial log on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;

use super::command::OutputLine;

/// File name of the stdout log.
pub const STDOUT_LOG: &str = "termstrap.out.log";

/// File name of the stderr log.
pub const STDERR_LOG: &str = "termstrap.err.log";

/// The pair of log files for one run.
#[derive(Debug)]
pub struct RunLog {
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    stdout: Mutex<File>,
    stderr: Mutex<File>,
}

impl RunLog {
    /// Open (creating if needed) both log files under `dir`.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let stdout_path = dir.join(STDOUT_LOG);
        let stderr_path = dir.join(STDERR_LOG);

        let stdout = append(&stdout_path)?;
        let stderr = append(&stderr_path)?;

        let log = Self {
            stdout_path,
            stderr_path,
            stdout: Mutex::new(stdout),
            stderr: Mutex::new(stderr),
        };
        log.banner();
        Ok(log)
    }

    /// Path of the stdout log.
    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    /// Path of the stderr log.
    pub fn stderr_path(&self) -> &Path {
        &self.stderr_path
    }

    /// A second handle on the stdout log, for a tracing writer.
    pub fn tracing_writer(&self) -> io::Result<Mutex<File>> {
        let file = self
            .stdout
            .lock()
            .map_err(|_| io::Error::other("run log lock poisoned"))?
            .try_clone()?;
        Ok(Mutex::new(file))
    }

    /// Append one line of command output to the matching file.
    pub fn record(&self, line: &OutputLine) {
        match line {
            OutputLine::Stdout(text) => write_line(&self.stdout, text),
            OutputLine::Stderr(text) => write_line(&self.stderr, text),
        }
    }

    /// Note the command about to run in both files.
    pub fn record_command(&self, command: &str) {
        let line = format!("$ {}", command);
        write_line(&self.stdout, &line);
        write_line(&self.stderr, &line);
    }

    fn banner(&self) {
        let line = format!(
            "==> termstrap {} run started {}",
            env!("CARGO_PKG_VERSION"),
            Local::now().to_rfc3339()
        );
        write_line(&self.stdout, &line);
        write_line(&self.stderr, &line);
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn write_line(file: &Mutex<File>, text: &str) {
    if let Ok(mut f) = file.lock() {
        writeln!(f, "{}", text).ok();
    }
}
