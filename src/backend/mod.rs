//! Package backends for the supported environments.

pub mod package;

pub use package::{
    resolve, resolve_with_privilege, CommandTemplate, PackageBackend, PackageManager,
    Prerequisite, PrerequisiteOutcome,
};
