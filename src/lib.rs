//! pokemem: inspect, search and edit the memory of a running Linux process

pub mod config;
pub mod core;
pub mod memory;
pub mod process;

// Re-export main types from core module
pub use crate::core::types::{
    Address, DataType, MemoryError, MemoryResult, ProcessId, SnapshotFormatError, TypedValue,
};

pub use memory::{
    AddressSpace, LoadSummary, MemoryAccess, MemoryImage, MemoryOperations, ResourceEstimate,
    SearchMode, SearchSession,
};
pub use process::{ProcessInfo, ProcessTarget};

// Re-export core directly for full access
pub use crate::core::*;
