//! Custom error types for pokemem

use std::fmt;
use thiserror::Error;

use super::{DataType, ProcessId};

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Can't access process {pid} anymore: {reason}")]
    ProcessUnreachable { pid: ProcessId, reason: String },

    #[error("Out of memory (trying to allocate {bytes} bytes)")]
    OutOfMemory { bytes: u64 },

    #[error("Invalid {data_type} value {input:?}: {reason}")]
    Parse {
        data_type: DataType,
        input: String,
        reason: String,
    },

    #[error("Malformed snapshot {path} at byte {offset}: {source}")]
    MalformedSnapshot {
        path: String,
        offset: u64,
        #[source]
        source: SnapshotFormatError,
    },

    #[error("Failed to write memory at {address}: wrote {actual} of {expected} bytes")]
    PartialWrite {
        address: String,
        expected: usize,
        actual: usize,
    },

    #[error("Address space is not searchable: {0}")]
    MisalignedAddressSpace(String),

    #[error("Process {pid} has no writable memory regions")]
    EmptyAddressSpace { pid: ProcessId },

    #[error("Search session belongs to process {session}, current process is {target}")]
    SessionMismatch {
        session: ProcessId,
        target: ProcessId,
    },

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while decoding a snapshot stream
#[derive(Error, Debug)]
pub enum SnapshotFormatError {
    #[error("not a memory snapshot (bad magic bytes)")]
    BadMagic,

    #[error("invalid address control byte 0x{0:02x}")]
    InvalidAddressControl(u8),

    #[error("invalid length control byte 0x{0:02x}")]
    InvalidLengthControl(u8),

    #[error("stream ended in the middle of a record")]
    Truncated,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates a process unreachable error
    pub fn unreachable(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::ProcessUnreachable {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a parse error for a user-entered value
    pub fn parse(data_type: DataType, input: impl Into<String>, reason: impl Into<String>) -> Self {
        MemoryError::Parse {
            data_type,
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a partial write error
    pub fn partial_write(address: impl fmt::Display, expected: usize, actual: usize) -> Self {
        MemoryError::PartialWrite {
            address: address.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a malformed snapshot error
    pub fn malformed_snapshot(
        path: impl fmt::Display,
        offset: u64,
        source: SnapshotFormatError,
    ) -> Self {
        MemoryError::MalformedSnapshot {
            path: path.to_string(),
            offset,
            source,
        }
    }

    /// True when the error means the target process is gone for good
    pub fn is_unreachable(&self) -> bool {
        matches!(self, MemoryError::ProcessUnreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoryError::unreachable(1234, "No such process");
        assert_eq!(
            err.to_string(),
            "Can't access process 1234 anymore: No such process"
        );

        let err = MemoryError::parse(DataType::U8, "300", "out of range");
        assert_eq!(err.to_string(), "Invalid u8 value \"300\": out of range");
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<(MemoryError, &str)> = vec![
            (
                MemoryError::OutOfMemory { bytes: 4096 },
                "Out of memory (trying to allocate 4096 bytes)",
            ),
            (
                MemoryError::partial_write("0x1000", 4, 2),
                "Failed to write memory at 0x1000: wrote 2 of 4 bytes",
            ),
            (
                MemoryError::MisalignedAddressSpace("total 100 bytes".to_string()),
                "Address space is not searchable: total 100 bytes",
            ),
            (
                MemoryError::EmptyAddressSpace { pid: 7 },
                "Process 7 has no writable memory regions",
            ),
            (
                MemoryError::SessionMismatch {
                    session: 1,
                    target: 2,
                },
                "Search session belongs to process 1, current process is 2",
            ),
            (
                MemoryError::InvalidAddress("zz".to_string()),
                "Invalid memory address: zz",
            ),
            (
                MemoryError::UnsupportedOperation("same/different".to_string()),
                "Unsupported operation: same/different",
            ),
            (
                MemoryError::malformed_snapshot(
                    "dump.bin",
                    12,
                    SnapshotFormatError::InvalidLengthControl(0xC1),
                ),
                "Malformed snapshot dump.bin at byte 12: invalid length control byte 0xc1",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_is_unreachable() {
        assert!(MemoryError::unreachable(1, "gone").is_unreachable());
        assert!(!MemoryError::OutOfMemory { bytes: 1 }.is_unreachable());
    }

    #[test]
    fn test_from_io_error() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let mem_err: MemoryError = io_err.into();
        assert!(matches!(mem_err, MemoryError::IoError(_)));

        let fmt_err: SnapshotFormatError = io::Error::new(io::ErrorKind::Other, "x").into();
        assert!(matches!(fmt_err, SnapshotFormatError::Io(_)));
    }
}
