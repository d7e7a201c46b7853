//! The process being inspected and its reachability

use crate::core::types::{MemoryError, MemoryResult, ProcessId};
use crate::process::handle::{AccessMode, ProcessHandle};
use serde::Serialize;
use tracing::warn;

/// Whether the target can still be accessed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum TargetState {
    Reachable,
    Unreachable(String),
}

/// A target process.
///
/// Once any open fails the target is marked unreachable and every later
/// open fails immediately with the same reason.
#[derive(Debug, Clone)]
pub struct ProcessTarget {
    pid: ProcessId,
    stop_while_accessing: bool,
    state: TargetState,
}

impl ProcessTarget {
    pub fn new(pid: ProcessId, stop_while_accessing: bool) -> Self {
        ProcessTarget {
            pid,
            stop_while_accessing,
            state: TargetState::Reachable,
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn stop_while_accessing(&self) -> bool {
        self.stop_while_accessing
    }

    pub fn state(&self) -> &TargetState {
        &self.state
    }

    pub fn is_reachable(&self) -> bool {
        self.state == TargetState::Reachable
    }

    /// Fails with the recorded reason if the target was lost
    pub fn ensure_reachable(&self) -> MemoryResult<()> {
        match &self.state {
            TargetState::Reachable => Ok(()),
            TargetState::Unreachable(reason) => Err(MemoryError::unreachable(self.pid, reason.clone())),
        }
    }

    /// Records that the target can no longer be accessed
    pub fn mark_unreachable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.is_reachable() {
            warn!(pid = self.pid, %reason, "target became unreachable");
        }
        self.state = TargetState::Unreachable(reason);
    }

    /// Marks the target unreachable if `err` says it is gone
    pub fn observe<T>(&mut self, result: MemoryResult<T>) -> MemoryResult<T> {
        if let Err(MemoryError::ProcessUnreachable { reason, .. }) = &result {
            self.mark_unreachable(reason.clone());
        }
        result
    }

    /// Opens a memory handle, pausing the target if configured to
    pub fn open(&mut self, mode: AccessMode) -> MemoryResult<ProcessHandle> {
        self.ensure_reachable()?;
        let result = ProcessHandle::open(self.pid, mode, self.stop_while_accessing);
        self.observe(result)
    }
}
