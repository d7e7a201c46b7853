//! Access to a target process on Linux
//!
//! This module provides the memory channel onto a process
//! (`/proc/<pid>/mem`), the scoped SIGSTOP/SIGCONT guard held while that
//! channel is open, and process identification from procfs.

pub mod handle;
pub mod info;
pub mod pause;
pub mod target;

pub use handle::{AccessMode, ProcessHandle};
pub use info::{exists, state, ProcessInfo};
pub use pause::PauseGuard;
pub use target::{ProcessTarget, TargetState};
