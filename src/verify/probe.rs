//! Tool lookup on PATH.

use std::path::{Path, PathBuf};

/// Check whether a path has any execute bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// First executable named `tool` in `path_entries`.
///
/// Walks the entries directly rather than asking `command -v`, so a
/// missing tool costs no process spawn.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    path_entries
        .iter()
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
}

/// Split `$PATH` into entries.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) fn create_fake_binary(path: &Path) {
    std::fs::write(path, "#!/bin/sh\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_first_match() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        create_fake_binary(&a.join("git"));
        create_fake_binary(&b.join("git"));

        assert_eq!(resolve_tool_path("git", &[a.clone(), b]), Some(a.join("git")));
    }

    #[test]
    fn none_when_missing() {
        let temp = TempDir::new().unwrap();
        assert!(resolve_tool_path("nvim", &[temp.path().to_path_buf()]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn skips_non_executable() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("zsh"), "not executable").unwrap();
        assert!(resolve_tool_path("zsh", &[temp.path().to_path_buf()]).is_none());
    }

    #[test]
    fn skips_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("curl")).unwrap();
        assert!(resolve_tool_path("curl", &[temp.path().to_path_buf()]).is_none());
    }
}
