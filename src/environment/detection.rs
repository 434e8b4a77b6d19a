//! Host environment detection.
//!
//! Classifies the running host as native Termux, an Ubuntu proot guest,
//! some other proot guest, or unknown. No single signal is trusted:
//! environment variables can be inherited into a guest, and marker files
//! vary between proot versions, so containment is decided by several
//! independent heuristics.
//!
//! Classification policy:
//!
//! 1. Any containment signal rules out `Termux`, even when Termux markers
//!    are also present (a guest launched from Termux inherits them).
//! 2. Inside a container, `UbuntuProot` needs os-release `ID=ubuntu` and
//!    `apt-get` in the guest; anything else is `OtherProot`.
//! 3. Termux markers with no containment signal give `Termux`.
//! 4. Otherwise `Unknown`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::kind::EnvironmentKind;
use super::procfs::{self, host_path};
use super::signals::Signal;

/// Default Termux installation prefix.
pub const TERMUX_PREFIX: &str = "/data/data/com.termux/files/usr";

/// Termux's application data directory.
pub const TERMUX_DATA_DIR: &str = "/data/data/com.termux";

/// Files that proot-distro leaves inside its guests.
const PROOT_MARKER_FILES: &[&str] = &["/etc/profile.d/termux-proot.sh"];

/// Result of probing the host.
#[derive(Debug, Clone)]
pub struct Detection {
    /// The classification.
    pub kind: EnvironmentKind,
    /// Every signal observed, in probe order.
    pub signals: Vec<Signal>,
}

impl Detection {
    /// Signals that indicate proot containment.
    pub fn containment_signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.is_containment())
    }
}

/// Probes the host for Termux and proot signals.
///
/// # Example
///
/// ```no_run
/// use termstrap::environment::EnvironmentProbe;
///
/// let detection = EnvironmentProbe::new().detect();
/// println!("running on {}", detection.kind);
/// ```
#[derive(Debug, Clone)]
pub struct EnvironmentProbe {
    root: PathBuf,
    pid: u32,
}

impl EnvironmentProbe {
    /// Probe the live host as the current process.
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/"),
            pid: std::process::id(),
        }
    }

    /// Resolve every host path under `root` instead of `/`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Start the ancestry walk at `pid` instead of the current process.
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// Detect using the real environment variables.
    pub fn detect(&self) -> Detection {
        self.detect_with_env(|key| std::env::var(key))
    }

    /// Detect with a custom env var lookup (for testing).
    pub fn detect_with_env<F>(&self, env_fn: F) -> Detection
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut signals = Vec::new();
        signals.extend(self.termux_signals(&env_fn));
        signals.extend(self.ancestry_signals());
        signals.extend(self.tracer_signal());
        signals.extend(self.marker_signals());
        signals.extend(self.inode_signal());
        signals.extend(self.distribution_signals());

        for signal in &signals {
            debug!("Environment signal: {}", signal);
        }

        let kind = classify(&signals);
        debug!("Classified host as {}", kind);

        Detection { kind, signals }
    }

    fn path(&self, path: &str) -> PathBuf {
        host_path(&self.root, path)
    }

    fn termux_signals<F>(&self, env_fn: &F) -> Vec<Signal>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut signals = Vec::new();

        if let Ok(value) = env_fn("TERMUX_VERSION") {
            if !value.is_empty() {
                signals.push(Signal::TermuxVersionVar { value });
            }
        }

        let prefix = env_fn("PREFIX")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| TERMUX_PREFIX.to_string());
        let prefix_path = self.path(&prefix);
        if prefix_path.join("bin").join("pkg").is_file() {
            signals.push(Signal::TermuxPrefix { path: prefix_path });
        }

        signals
    }

    fn ancestry_signals(&self) -> Vec<Signal> {
        procfs::ancestry(&self.root, self.pid)
            .into_iter()
            .filter(|stat| is_proot_name(&stat.comm))
            .map(|stat| Signal::ProotAncestor {
                pid: stat.pid,
                comm: stat.comm,
            })
            .collect()
    }

    fn tracer_signal(&self) -> Option<Signal> {
        let tracer = procfs::tracer_pid(&self.root, self.pid)?;
        let comm = procfs::read_comm(&self.root, tracer)
            .or_else(|| procfs::read_stat(&self.root, tracer).map(|s| s.comm))?;
        is_proot_name(&comm).then_some(Signal::ProotTracer { pid: tracer, comm })
    }

    fn marker_signals(&self) -> Vec<Signal> {
        PROOT_MARKER_FILES
            .iter()
            .map(|marker| self.path(marker))
            .filter(|path| path.exists())
            .map(|path| Signal::ProotMarkerFile { path })
            .collect()
    }

    fn inode_signal(&self) -> Option<Signal> {
        let root = procfs::inode_of(&self.root)?;
        let init_root = procfs::inode_of(&self.path("/proc/1/root"))?;
        (root != init_root).then_some(Signal::RootInodeMismatch { root, init_root })
    }

    fn distribution_signals(&self) -> Vec<Signal> {
        let mut signals = Vec::new();
        let os_release = self.path("/etc/os-release");

        let Ok(contents) = fs::read_to_string(&os_release) else {
            return signals;
        };

        if let Some(id) = parse_os_release(&contents).remove("ID") {
            signals.push(Signal::OsRelease { id });
        }

        let apt = self.path("/usr/bin/apt-get");
        if apt.is_file() {
            signals.push(Signal::AptAvailable { path: apt });
        }

        // A distribution root that can see Termux's private data directory
        // only exists when that directory was bind-mounted into a guest.
        let termux_data = self.path(TERMUX_DATA_DIR);
        if termux_data.is_dir() {
            signals.push(Signal::TermuxBindMount { path: termux_data });
        }

        signals
    }
}

impl Default for EnvironmentProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce a set of signals to an [`EnvironmentKind`].
pub fn classify(signals: &[Signal]) -> EnvironmentKind {
    let contained = signals.iter().any(Signal::is_containment);
    let termux = signals.iter().any(Signal::is_termux_marker);

    if contained {
        let ubuntu = signals
            .iter()
            .any(|s| matches!(s, Signal::OsRelease { id } if id == "ubuntu"));
        let apt = signals
            .iter()
            .any(|s| matches!(s, Signal::AptAvailable { .. }));
        if ubuntu && apt {
            EnvironmentKind::UbuntuProot
        } else {
            EnvironmentKind::OtherProot
        }
    } else if termux {
        EnvironmentKind::Termux
    } else {
        EnvironmentKind::Unknown
    }
}

/// Parse os-release `KEY=value` lines, stripping optional quotes.
pub fn parse_os_release(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

fn is_proot_name(comm: &str) -> bool {
    Path::new(comm)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("proot"))
        .unwrap_or(false)
}
