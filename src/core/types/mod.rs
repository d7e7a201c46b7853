//! Core type definitions for pokemem
//!
//! Address wrapper, item data types, typed values and error types shared by
//! every other module.

mod address;
pub mod character;
mod data_type;
mod error;
mod value;

// Re-export all public types
pub use address::Address;
pub use data_type::{DataType, TypeInfo, TypeKind};
pub use error::{MemoryError, MemoryResult, SnapshotFormatError};
pub use value::{TypedValue, MAX_VALUE_SIZE};

// Common type aliases
pub type ProcessId = i32;
