//! Host environment classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of host termstrap is running on.
///
/// Computed once at startup and never changed for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    /// Native Termux process on Android.
    Termux,
    /// Ubuntu guest running under proot.
    UbuntuProot,
    /// Some container-like root whose distribution could not be confirmed.
    OtherProot,
    /// None of the known signals matched.
    Unknown,
}

impl EnvironmentKind {
    /// Whether a package backend exists for this kind.
    pub fn is_supported(&self) -> bool {
        matches!(self, EnvironmentKind::Termux | EnvironmentKind::UbuntuProot)
    }

    /// Whether this kind runs inside a proot guest.
    pub fn is_proot(&self) -> bool {
        matches!(
            self,
            EnvironmentKind::UbuntuProot | EnvironmentKind::OtherProot
        )
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnvironmentKind::Termux => "termux",
            EnvironmentKind::UbuntuProot => "ubuntu proot",
            EnvironmentKind::OtherProot => "other proot",
            EnvironmentKind::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
