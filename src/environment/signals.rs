//! Host signals observed during environment detection.

use std::fmt;
use std::path::PathBuf;

/// A single piece of evidence about the host.
///
/// Signals are collected in full (not short-circuited) so that `termstrap
/// detect` can show why a host was classified the way it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// `TERMUX_VERSION` is set.
    TermuxVersionVar { value: String },
    /// The Termux installation prefix exists with its `pkg` executable.
    TermuxPrefix { path: PathBuf },
    /// A process in our ancestry is proot.
    ProotAncestor { pid: u32, comm: String },
    /// The current process is being ptraced by proot.
    ProotTracer { pid: u32, comm: String },
    /// A file that proot-based distributions leave behind.
    ProotMarkerFile { path: PathBuf },
    /// `/` and init's root are different inodes.
    RootInodeMismatch { root: (u64, u64), init_root: (u64, u64) },
    /// Termux's data directory is visible inside a distribution root.
    TermuxBindMount { path: PathBuf },
    /// The distribution identifier from os-release.
    OsRelease { id: String },
    /// apt-get is present in the guest.
    AptAvailable { path: PathBuf },
}

impl Signal {
    /// Whether this signal indicates proot containment.
    pub fn is_containment(&self) -> bool {
        matches!(
            self,
            Signal::ProotAncestor { .. }
                | Signal::ProotTracer { .. }
                | Signal::ProotMarkerFile { .. }
                | Signal::RootInodeMismatch { .. }
                | Signal::TermuxBindMount { .. }
        )
    }

    /// Whether this signal indicates a Termux runtime.
    pub fn is_termux_marker(&self) -> bool {
        matches!(
            self,
            Signal::TermuxVersionVar { .. } | Signal::TermuxPrefix { .. }
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::TermuxVersionVar { value } => write!(f, "TERMUX_VERSION={}", value),
            Signal::TermuxPrefix { path } => write!(f, "termux prefix at {}", path.display()),
            Signal::ProotAncestor { pid, comm } => {
                write!(f, "ancestor process {} ({}) is proot", pid, comm)
            }
            Signal::ProotTracer { pid, comm } => {
                write!(f, "traced by process {} ({})", pid, comm)
            }
            Signal::ProotMarkerFile { path } => write!(f, "marker file {}", path.display()),
            Signal::RootInodeMismatch { root, init_root } => write!(
                f,
                "root inode {}:{} differs from init root {}:{}",
                root.0, root.1, init_root.0, init_root.1
            ),
            Signal::TermuxBindMount { path } => {
                write!(f, "termux data bound at {}", path.display())
            }
            Signal::OsRelease { id } => write!(f, "os-release ID={}", id),
            Signal::AptAvailable { path } => write!(f, "apt-get at {}", path.display()),
        }
    }
}
