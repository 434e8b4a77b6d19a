//! Minimal readers for the `/proc` entries used by proot detection.
//!
//! Every function takes the filesystem root explicitly so that tests can
//! point them at a fixture tree instead of the live `/proc`.

use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound on ancestry walks, in case `/proc` reports a cycle.
const MAX_ANCESTRY_DEPTH: usize = 64;

/// Join an absolute host path onto a (possibly fixture) root.
pub fn host_path(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}

/// Parsed subset of `/proc/<pid>/stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub ppid: u32,
}

/// Parse the contents of a `/proc/<pid>/stat` file.
///
/// The command name is wrapped in parentheses and may itself contain spaces
/// or parentheses, so the last `)` delimits it.
pub fn parse_stat(contents: &str) -> Option<ProcStat> {
    let open = contents.find('(')?;
    let close = contents.rfind(')')?;
    if close <= open {
        return None;
    }

    let pid = contents[..open].trim().parse().ok()?;
    let comm = contents[open + 1..close].to_string();
    let mut rest = contents[close + 1..].split_whitespace();
    let _state = rest.next()?;
    let ppid = rest.next()?.parse().ok()?;

    Some(ProcStat { pid, comm, ppid })
}

/// Read and parse `/proc/<pid>/stat` under `root`.
pub fn read_stat(root: &Path, pid: u32) -> Option<ProcStat> {
    let path = host_path(root, &format!("/proc/{}/stat", pid));
    let contents = fs::read_to_string(path).ok()?;
    parse_stat(&contents)
}

/// Read `/proc/<pid>/comm` under `root`.
pub fn read_comm(root: &Path, pid: u32) -> Option<String> {
    let path = host_path(root, &format!("/proc/{}/comm", pid));
    let comm = fs::read_to_string(path).ok()?.trim().to_string();
    if comm.is_empty() {
        None
    } else {
        Some(comm)
    }
}

/// Walk from `pid` up to PID 1, returning each ancestor (including `pid`).
pub fn ancestry(root: &Path, pid: u32) -> Vec<ProcStat> {
    let mut chain = Vec::new();
    let mut current = pid;

    while current >= 1 && chain.len() < MAX_ANCESTRY_DEPTH {
        let Some(stat) = read_stat(root, current) else {
            break;
        };
        let next = stat.ppid;
        chain.push(stat);
        if current == 1 || next == current {
            break;
        }
        current = next;
    }

    chain
}

/// Read the `TracerPid` field of `/proc/<pid>/status`.
///
/// Returns `None` when the process is not traced.
pub fn tracer_pid(root: &Path, pid: u32) -> Option<u32> {
    let path = host_path(root, &format!("/proc/{}/status", pid));
    let contents = fs::read_to_string(path).ok()?;
    contents
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|tracer| *tracer != 0)
}

/// `(device, inode)` of a path, following symlinks.
#[cfg(unix)]
pub fn inode_of(path: &Path) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).ok().map(|m| (m.dev(), m.ino()))
}

#[cfg(not(unix))]
pub fn inode_of(_path: &Path) -> Option<(u64, u64)> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_proc(root: &Path, pid: u32, comm: &str, ppid: u32) {
        let dir = root.join(format!("proc/{}", pid));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("stat"),
            format!("{} ({}) S {} 1 1 0 -1", pid, comm, ppid),
        )
        .unwrap();
    }

    #[test]
    fn parse_stat_reads_pid_comm_and_ppid() {
        let stat = parse_stat("1234 (zsh) S 1200 1234 1234 34816").unwrap();
        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "zsh");
        assert_eq!(stat.ppid, 1200);
    }

    #[test]
    fn parse_stat_handles_parentheses_in_comm() {
        let stat = parse_stat("77 (weird (name)) R 5 77 77").unwrap();
        assert_eq!(stat.comm, "weird (name)");
        assert_eq!(stat.ppid, 5);
    }

    #[test]
    fn parse_stat_rejects_garbage() {
        assert!(parse_stat("not a stat line").is_none());
        assert!(parse_stat("12 (x)").is_none());
    }

    #[test]
    fn ancestry_walks_to_init() {
        let temp = TempDir::new().unwrap();
        write_proc(temp.path(), 300, "sh", 200);
        write_proc(temp.path(), 200, "proot", 100);
        write_proc(temp.path(), 100, "bash", 1);
        write_proc(temp.path(), 1, "init", 0);

        let chain = ancestry(temp.path(), 300);
        let comms: Vec<_> = chain.iter().map(|s| s.comm.as_str()).collect();
        assert_eq!(comms, vec!["sh", "proot", "bash", "init"]);
    }

    #[test]
    fn ancestry_stops_at_missing_entry() {
        let temp = TempDir::new().unwrap();
        write_proc(temp.path(), 50, "sh", 40);

        let chain = ancestry(temp.path(), 50);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn ancestry_survives_self_parent_cycle() {
        let temp = TempDir::new().unwrap();
        write_proc(temp.path(), 9, "loop", 9);
        assert_eq!(ancestry(temp.path(), 9).len(), 1);
    }

    #[test]
    fn tracer_pid_ignores_zero() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("proc/5");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("status"), "Name:\tsh\nTracerPid:\t0\n").unwrap();
        assert_eq!(tracer_pid(temp.path(), 5), None);

        fs::write(dir.join("status"), "Name:\tsh\nTracerPid:\t812\n").unwrap();
        assert_eq!(tracer_pid(temp.path(), 5), Some(812));
    }

    #[test]
    fn host_path_joins_absolute_paths() {
        let joined = host_path(Path::new("/tmp/root"), "/etc/os-release");
        assert_eq!(joined, PathBuf::from("/tmp/root/etc/os-release"));
    }
}
