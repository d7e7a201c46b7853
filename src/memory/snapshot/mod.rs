//! Sparse memory snapshots
//!
//! A snapshot is a list of `(address, bytes)` runs in a compact binary
//! format (see [`format`]). Loading one writes every run back into the
//! target, so a dump of the whole address space restores it and a dump of
//! search candidates restores only those items.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::MAGIC;
pub use reader::SnapshotReader;
pub use writer::SnapshotWriter;

use crate::core::types::{Address, MemoryError, MemoryResult, SnapshotFormatError};
use crate::memory::access::MemoryAccess;
use crate::memory::regions::AddressSpace;
use crate::memory::search::SearchSession;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Bytes read (and written as one run) at a time by [`dump_all`]
pub const DUMP_CHUNK_SIZE: usize = 4096;

/// One contiguous stretch of saved memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRun {
    pub address: Address,
    pub bytes: Vec<u8>,
}

/// Runs and payload bytes moved by a dump or load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub runs: u64,
    pub bytes: u64,
}

/// Result of replaying a snapshot
pub type LoadSummary = SnapshotSummary;

/// Saves every byte of every region, one run per chunk.
///
/// Bytes that can't be read are saved as zeros so the runs always cover
/// the regions exactly.
pub fn dump_all<A, W>(access: &mut A, space: &AddressSpace, writer: W) -> MemoryResult<SnapshotSummary>
where
    A: MemoryAccess + ?Sized,
    W: Write,
{
    let mut out = SnapshotWriter::new(writer)?;
    let mut buf = vec![0u8; DUMP_CHUNK_SIZE];
    let mut short_reads = 0u64;

    for region in space {
        let mut offset = 0u64;
        while offset < region.size {
            let len = (region.size - offset).min(DUMP_CHUNK_SIZE as u64) as usize;
            let address = region.base.add(offset);
            let chunk = &mut buf[..len];
            if access.read_zero_filled(address, chunk) < len {
                short_reads += 1;
            }
            out.write_run(address, chunk)?;
            offset += len as u64;
        }
    }

    let (_, summary) = out.finish()?;
    debug!(
        regions = space.len(),
        runs = summary.runs,
        bytes = summary.bytes,
        short_reads,
        "dumped address space"
    );
    Ok(summary)
}

/// Saves the current bytes of every live search candidate, one run each
pub fn dump_candidates<A, W>(
    access: &mut A,
    session: &SearchSession,
    writer: W,
    chunk_size: usize,
) -> MemoryResult<SnapshotSummary>
where
    A: MemoryAccess + ?Sized,
    W: Write,
{
    let mut out = SnapshotWriter::new(writer)?;
    let width = session.data_type().size() as u64;
    let mut cursor = session.chunk_cursor(chunk_size);
    let mut buf = Vec::new();

    while let Some(chunk) = session.next_chunk(&mut cursor) {
        buf.resize(chunk.byte_len(width), 0);
        access.read_zero_filled(chunk.address, &mut buf);

        let mut from = chunk.first_index;
        while let Some(index) = session.bits().next_set_before(from, chunk.end_index) {
            let offset = (index - chunk.first_index) * width;
            let item = &buf[offset as usize..(offset + width) as usize];
            out.write_run(chunk.address.add(offset), item)?;
            from = index + 1;
        }
    }

    let (_, summary) = out.finish()?;
    debug!(runs = summary.runs, "dumped search candidates");
    Ok(summary)
}

/// Writes every run of a snapshot stream back into memory.
///
/// Stops at the first malformed record or short write; runs already
/// written stay written.
pub fn load<A, R>(access: &mut A, reader: R) -> MemoryResult<LoadSummary>
where
    A: MemoryAccess + ?Sized,
    R: Read,
{
    load_named(access, reader, "<stream>")
}

fn load_named<A, R>(access: &mut A, reader: R, name: &str) -> MemoryResult<LoadSummary>
where
    A: MemoryAccess + ?Sized,
    R: Read,
{
    let malformed = |offset: u64, e: SnapshotFormatError| match e {
        SnapshotFormatError::Io(io) => MemoryError::IoError(io),
        other => MemoryError::malformed_snapshot(name, offset, other),
    };

    let mut runs = SnapshotReader::new(reader).map_err(|e| malformed(0, e))?;
    let mut summary = LoadSummary::default();

    while let Some(run) = runs.next() {
        let run = run.map_err(|e| malformed(runs.record_offset(), e))?;
        let written = access.write_at(run.address, &run.bytes);
        if written < run.bytes.len() {
            return Err(MemoryError::partial_write(run.address, run.bytes.len(), written));
        }
        summary.runs += 1;
        summary.bytes += run.bytes.len() as u64;
    }

    info!(snapshot = name, runs = summary.runs, bytes = summary.bytes, "loaded snapshot");
    Ok(summary)
}

/// [`dump_all`] into a new file at `path`
pub fn dump_all_to_path<A>(access: &mut A, space: &AddressSpace, path: &Path) -> MemoryResult<SnapshotSummary>
where
    A: MemoryAccess + ?Sized,
{
    let file = File::create(path)?;
    dump_all(access, space, BufWriter::new(file))
}

/// [`dump_candidates`] into a new file at `path`
pub fn dump_candidates_to_path<A>(
    access: &mut A,
    session: &SearchSession,
    path: &Path,
    chunk_size: usize,
) -> MemoryResult<SnapshotSummary>
where
    A: MemoryAccess + ?Sized,
{
    let file = File::create(path)?;
    dump_candidates(access, session, BufWriter::new(file), chunk_size)
}

/// [`load`] from the file at `path`; format errors name the file
pub fn load_from_path<A>(access: &mut A, path: &Path) -> MemoryResult<LoadSummary>
where
    A: MemoryAccess + ?Sized,
{
    let file = File::open(path)?;
    load_named(access, BufReader::new(file), &path.display().to_string())
}
