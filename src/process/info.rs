//! Process identification from procfs

use crate::core::types::ProcessId;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name shown when a process's command line cannot be read
pub const UNKNOWN_PROCESS: &str = "Unknown process.";

/// Information about a running process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    /// First command-line argument, or [`UNKNOWN_PROCESS`]
    pub name: String,
}

impl ProcessInfo {
    pub fn new(pid: ProcessId, name: String) -> Self {
        ProcessInfo { pid, name }
    }

    /// Reads the name from `/proc/<pid>/cmdline`.
    ///
    /// Kernel threads and exited processes have no command line and get
    /// the placeholder name.
    pub fn from_pid(pid: ProcessId) -> Self {
        let name = std::fs::read(proc_dir(pid).join("cmdline"))
            .ok()
            .and_then(|raw| name_from_cmdline(&raw))
            .unwrap_or_else(|| UNKNOWN_PROCESS.to_string());
        ProcessInfo { pid, name }
    }
}

impl fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

fn proc_dir(pid: ProcessId) -> PathBuf {
    Path::new("/proc").join(pid.to_string())
}

/// argv[0] from a NUL-separated command line
pub fn name_from_cmdline(raw: &[u8]) -> Option<String> {
    let first = raw.split(|&b| b == 0).next()?;
    if first.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(first).into_owned())
}

/// Scheduler state letter from `/proc/<pid>/stat` (`R`, `S`, `T`, ...)
pub fn state(pid: ProcessId) -> Option<char> {
    let stat = std::fs::read_to_string(proc_dir(pid).join("stat")).ok()?;
    state_from_stat(&stat)
}

/// The state field of a stat line; the command name may itself contain `)`
pub fn state_from_stat(stat: &str) -> Option<char> {
    let (_, rest) = stat.rsplit_once(") ")?;
    rest.chars().next()
}

/// Whether a process with this pid currently exists
pub fn exists(pid: ProcessId) -> bool {
    pid > 0 && proc_dir(pid).is_dir()
}
