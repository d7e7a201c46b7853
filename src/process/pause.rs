//! Scoped pause/resume of a target process

use crate::core::types::{MemoryError, MemoryResult, ProcessId};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{trace, warn};

/// Keeps a process stopped with SIGSTOP for as long as it lives.
///
/// Dropping the guard sends SIGCONT, on every exit path. A failed resume at
/// drop is logged since there is no caller left to report it to.
#[derive(Debug)]
pub struct PauseGuard {
    pid: ProcessId,
    resumed: bool,
}

impl PauseGuard {
    /// Sends SIGSTOP to `pid`
    pub fn pause(pid: ProcessId) -> MemoryResult<Self> {
        kill(Pid::from_raw(pid), Signal::SIGSTOP)
            .map_err(|errno| MemoryError::unreachable(pid, errno.desc()))?;
        trace!(pid, "paused target");
        Ok(PauseGuard {
            pid,
            resumed: false,
        })
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Sends SIGCONT now instead of at drop
    pub fn resume(&mut self) -> MemoryResult<()> {
        if self.resumed {
            return Ok(());
        }
        self.resumed = true;
        kill(Pid::from_raw(self.pid), Signal::SIGCONT)
            .map_err(|errno| MemoryError::unreachable(self.pid, errno.desc()))?;
        trace!(pid = self.pid, "resumed target");
        Ok(())
    }
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        if let Err(e) = self.resume() {
            warn!("failed to resume process {}: {}", self.pid, e);
        }
    }
}
