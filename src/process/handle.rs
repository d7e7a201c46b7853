//! Positional access to a target's memory through `/proc/<pid>/mem`

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::access::MemoryAccess;
use crate::process::pause::PauseGuard;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::trace;

/// How the memory file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "read"),
            AccessMode::Write => write!(f, "write"),
        }
    }
}

/// Path of the memory file for `pid`
pub fn mem_path(pid: ProcessId) -> PathBuf {
    PathBuf::from(format!("/proc/{}/mem", pid))
}

/// An open memory channel onto one process.
///
/// Holds the target stopped for its whole lifetime when opened with
/// `stop_while_accessing`. Closing (or dropping) releases the file and then
/// resumes the target.
pub struct ProcessHandle {
    pid: ProcessId,
    mode: AccessMode,
    file: Option<File>,
    pause: Option<PauseGuard>,
}

impl ProcessHandle {
    /// Opens the memory file of `pid`, pausing the process first if asked
    pub fn open(pid: ProcessId, mode: AccessMode, stop_while_accessing: bool) -> MemoryResult<Self> {
        Self::open_at(pid, mode, stop_while_accessing, &mem_path(pid))
    }

    fn open_at(pid: ProcessId, mode: AccessMode, stop_while_accessing: bool, path: &Path) -> MemoryResult<Self> {
        let pause = if stop_while_accessing {
            Some(PauseGuard::pause(pid)?)
        } else {
            None
        };

        // On failure the guard drops here and resumes the target
        let file = OpenOptions::new()
            .read(mode == AccessMode::Read)
            .write(mode == AccessMode::Write)
            .open(path)
            .map_err(|e| MemoryError::unreachable(pid, e.to_string()))?;

        trace!(pid, %mode, "opened process memory");
        Ok(ProcessHandle {
            pid,
            mode,
            file: Some(file),
            pause,
        })
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_some()
    }

    /// Releases the memory file and resumes the target; idempotent
    pub fn close(&mut self) -> MemoryResult<()> {
        self.file = None;
        match self.pause.take() {
            Some(mut guard) => guard.resume(),
            None => Ok(()),
        }
    }

    fn read_once(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        loop {
            match file.read_at(buf, offset) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn write_once(file: &File, data: &[u8], offset: u64) -> io::Result<usize> {
        loop {
            match file.write_at(data, offset) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

impl MemoryAccess for ProcessHandle {
    fn read_at(&mut self, address: Address, buf: &mut [u8]) -> usize {
        let Some(file) = self.file.as_ref() else {
            return 0;
        };
        let mut done = 0;
        while done < buf.len() {
            match Self::read_once(file, &mut buf[done..], address.as_u64() + done as u64) {
                Ok(0) | Err(_) => break,
                Ok(n) => done += n,
            }
        }
        done
    }

    fn write_at(&mut self, address: Address, data: &[u8]) -> usize {
        if self.mode != AccessMode::Write {
            return 0;
        }
        let Some(file) = self.file.as_ref() else {
            return 0;
        };
        let mut done = 0;
        while done < data.len() {
            match Self::write_once(file, &data[done..], address.as_u64() + done as u64) {
                Ok(0) | Err(_) => break,
                Ok(n) => done += n,
            }
        }
        done
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // PauseGuard's own drop logs a failed resume
        self.file = None;
        self.pause = None;
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .field("paused", &self.is_paused())
            .finish()
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessHandle(pid={}, mode={}, open={})",
            self.pid,
            self.mode,
            self.is_open()
        )
    }
}
