//! Host environment detection.
//!
//! Determines whether termstrap runs natively in Termux or inside a
//! proot-hosted guest. The classification is computed once per run by
//! [`EnvironmentProbe::detect`] and drives package backend resolution.

pub mod detection;
pub mod kind;
pub mod procfs;
pub mod signals;

pub use detection::{classify, parse_os_release, Detection, EnvironmentProbe, TERMUX_PREFIX};
pub use kind::EnvironmentKind;
pub use signals::Signal;
