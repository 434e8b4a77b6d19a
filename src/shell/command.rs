//! Shell command execution.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::log::RunLog;

/// Poll interval while waiting on a command with a timeout.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// Whether the command was killed for exceeding its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            timed_out: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            timed_out: false,
        }
    }

    /// First non-empty line of stdout, falling back to stderr.
    pub fn first_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Timeout (None = wait forever).
    pub timeout: Option<Duration>,
}

impl CommandOptions {
    /// Add an environment variable.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }
}

/// Output line from command execution.
#[derive(Debug, Clone)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Callback for streaming output.
pub type OutputCallback = Arc<dyn Fn(&OutputLine) + Send + Sync>;

/// Runs external commands on behalf of provisioning steps.
///
/// Every package manager call, remote installer and editor invocation goes
/// through this trait, so tests can substitute [`MockRunner`](super::MockRunner).
pub trait CommandRunner: Send + Sync {
    /// Run a shell command line to completion.
    ///
    /// Returns `Err` only when the command could not be started; a command
    /// that runs and exits non-zero is an `Ok` result with `success == false`.
    fn run(&self, command: &str, options: &CommandOptions) -> io::Result<CommandResult>;

    /// Run a command and report whether it exited successfully.
    fn check(&self, command: &str) -> bool {
        self.run(command, &CommandOptions::default())
            .map(|r| r.success)
            .unwrap_or(false)
    }

    /// Run a command and return its stdout when it succeeds.
    fn capture(&self, command: &str) -> Option<String> {
        self.run(command, &CommandOptions::default())
            .ok()
            .filter(|r| r.success)
            .map(|r| r.stdout)
    }
}

/// Runs commands through `sh -c`, streaming output into the run log.
#[derive(Clone, Default)]
pub struct ShellRunner {
    log: Option<Arc<RunLog>>,
    on_output: Option<OutputCallback>,
    default_timeout: Option<Duration>,
}

impl ShellRunner {
    /// Create a runner that only captures output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every output line to `log`.
    pub fn with_log(mut self, log: Arc<RunLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Forward every output line to `callback` as it arrives.
    pub fn with_output_callback(mut self, callback: OutputCallback) -> Self {
        self.on_output = Some(callback);
        self
    }

    /// Apply `timeout` to commands that don't set their own.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    fn forward(&self, line: OutputLine) -> String {
        if let Some(log) = &self.log {
            log.record(&line);
        }
        if let Some(callback) = &self.on_output {
            callback(&line);
        }
        match line {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
        }
    }
}

impl std::fmt::Debug for ShellRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellRunner")
            .field("log", &self.log.is_some())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> io::Result<CommandResult> {
        let start = Instant::now();
        debug!("Running: {}", command);
        if let Some(log) = &self.log {
            log.record_command(command);
        }

        // Resolved through PATH: Termux has no /bin/sh.
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let timeout = options.timeout.or(self.default_timeout);

        // Own process group, so a timeout can kill grandchildren holding the pipes.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if timeout.is_some() {
                cmd.process_group(0);
            }
        }

        let mut child = cmd.spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let out_runner = self.clone();
        let stdout_handle =
            thread::spawn(move || drain(stdout, |l| out_runner.forward(OutputLine::Stdout(l))));
        let err_runner = self.clone();
        let stderr_handle =
            thread::spawn(move || drain(stderr, |l| err_runner.forward(OutputLine::Stderr(l))));

        let (status, timed_out) = wait_with_timeout(&mut child, timeout)?;

        let stdout_output = stdout_handle.join().unwrap_or_default();
        let stderr_output = stderr_handle.join().unwrap_or_default();
        let duration = start.elapsed();

        if timed_out {
            warn!("Command timed out after {:?}: {}", duration, command);
            let mut result = CommandResult::failure(None, stdout_output, stderr_output, duration);
            result.timed_out = true;
            return Ok(result);
        }

        match status {
            Some(0) => Ok(CommandResult::success(
                stdout_output,
                stderr_output,
                duration,
            )),
            code => Ok(CommandResult::failure(
                code,
                stdout_output,
                stderr_output,
                duration,
            )),
        }
    }
}

fn drain<R: Read>(reader: Option<R>, mut on_line: impl FnMut(String) -> String) -> String {
    let mut output = String::new();
    if let Some(reader) = reader {
        for line in BufReader::new(reader)
            .lines()
            .map_while(std::result::Result::ok)
        {
            output.push_str(&on_line(line));
            output.push('\n');
        }
    }
    output
}

/// Wait for `child`, killing it once `timeout` elapses.
///
/// Returns the exit code (None if killed by a signal) and whether the
/// timeout fired.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> io::Result<(Option<i32>, bool)> {
    let Some(timeout) = timeout else {
        let status = child.wait()?;
        return Ok((status.code(), false));
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status.code(), false));
        }
        if Instant::now() >= deadline {
            kill_tree(child)?;
            child.wait()?;
            return Ok((None, true));
        }
        thread::sleep(WAIT_POLL);
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: signalling a process group we created; no memory is shared.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc == 0 {
        Ok(())
    } else {
        child.kill()
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> io::Result<()> {
    child.kill()
}

/// Quote a value for inclusion in a `sh -c` command line.
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,%".contains(c))
    {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
