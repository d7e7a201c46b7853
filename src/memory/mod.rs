//! Memory operations module for inspecting, searching and snapshotting
//! process memory
//!
//! This module provides:
//! - The [`MemoryAccess`] seam and an in-memory [`MemoryImage`]
//! - Region enumeration into an [`AddressSpace`]
//! - Bitset-backed multi-pass value search
//! - The sparse binary snapshot format
//! - The [`MemoryOperations`] facade tying these to a target process

pub mod access;
pub mod bitset;
pub mod operations;
pub mod regions;
pub mod search;
pub mod snapshot;

pub use access::{MemoryAccess, MemoryImage};
pub use bitset::CandidateBits;
pub use operations::MemoryOperations;
pub use regions::{AddressSpace, FilterCriteria, MemoryRegion, Permissions, RegionFilter};
pub use search::{format_byte_size, ResourceEstimate, SearchMode, SearchSession, DEFAULT_CHUNK_SIZE};
pub use snapshot::{LoadSummary, SnapshotReader, SnapshotRun, SnapshotSummary, SnapshotWriter};
