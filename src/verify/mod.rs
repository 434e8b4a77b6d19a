//! Verification of installed tools after a run.

pub mod probe;
pub mod reporter;

pub use probe::{is_executable, parse_system_path, resolve_tool_path};
pub use reporter::{extract_version, ToolReport, ToolStatus, VerificationReporter};
