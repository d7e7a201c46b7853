//! Streaming snapshot encoder

use super::format::{encode_address, encode_length, MAGIC};
use super::SnapshotSummary;
use crate::core::types::Address;
use std::io::{self, Write};

/// Writes runs in the snapshot format.
///
/// The magic is written on creation. Runs should come in increasing
/// address order; a run starting below the previous end still encodes,
/// just with an absolute address.
pub struct SnapshotWriter<W: Write> {
    inner: W,
    prev_end: u64,
    header: Vec<u8>,
    summary: SnapshotSummary,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(mut inner: W) -> io::Result<Self> {
        inner.write_all(&MAGIC)?;
        Ok(SnapshotWriter {
            inner,
            prev_end: 0,
            header: Vec::with_capacity(2 + 2 * 8),
            summary: SnapshotSummary::default(),
        })
    }

    /// Appends one record
    pub fn write_run(&mut self, address: Address, bytes: &[u8]) -> io::Result<()> {
        let len = bytes.len() as u64;
        self.header.clear();
        encode_address(&mut self.header, self.prev_end, address.as_u64());
        encode_length(&mut self.header, len);

        self.inner.write_all(&self.header)?;
        self.inner.write_all(bytes)?;

        self.prev_end = address.as_u64().wrapping_add(len);
        self.summary.runs += 1;
        self.summary.bytes += len;
        Ok(())
    }

    /// Runs and payload bytes written so far
    pub fn summary(&self) -> SnapshotSummary {
        self.summary
    }

    /// Flushes and hands back the underlying writer
    pub fn finish(mut self) -> io::Result<(W, SnapshotSummary)> {
        self.inner.flush()?;
        Ok((self.inner, self.summary))
    }
}
