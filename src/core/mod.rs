//! Core module containing fundamental types for pokemem
//!
//! This module provides the foundational building blocks used throughout
//! the crate: addresses, item data types with their text codec, and the
//! error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address,
    DataType,
    MemoryError,
    MemoryResult,
    ProcessId,
    SnapshotFormatError,
    TypedValue,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

// /proc/<pid>/mem and SIGSTOP are Linux interfaces
#[cfg(not(target_os = "linux"))]
compile_error!("pokemem only supports Linux");
