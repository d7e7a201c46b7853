//! Multi-pass elimination search over a process's writable memory
//!
//! A [`SearchSession`] starts with every item of the address space as a
//! candidate, one bit each. Each pass reads memory chunk by chunk and
//! clears the bits of items that no longer hold the searched value. Chunks
//! with no live candidates are never read, and finding them costs one word
//! test per 64 items.

use crate::core::types::{Address, DataType, MemoryError, MemoryResult, ProcessId, TypedValue};
use crate::memory::access::MemoryAccess;
use crate::memory::bitset::CandidateBits;
use crate::memory::regions::AddressSpace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Default number of bytes read per chunk during a pass
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Total searchable bytes must be a multiple of this, so that the bitset
/// is a whole number of bytes for every item width
pub const SPACE_ALIGNMENT: u64 = 512;

/// How candidates are eliminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// Keep items equal to a value the user enters each pass
    EnterValue,
    /// Keep items that stayed the same (or changed) between two snapshots
    SameDifferent,
}

impl SearchMode {
    pub fn name(self) -> &'static str {
        match self {
            SearchMode::EnterValue => "enter-value",
            SearchMode::SameDifferent => "same-different",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchMode {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter-value" => Ok(SearchMode::EnterValue),
            "same-different" => Ok(SearchMode::SameDifferent),
            other => Err(MemoryError::UnsupportedOperation(format!(
                "unknown search mode {:?}",
                other
            ))),
        }
    }
}

/// Memory and disk a search would need, shown before starting one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceEstimate {
    pub memory_bytes: u64,
    pub disk_bytes: u64,
}

impl ResourceEstimate {
    pub fn for_search(space: &AddressSpace, data_type: DataType, mode: SearchMode) -> Self {
        let total_items = space.total_bytes() / data_type.size() as u64;
        let disk_bytes = match mode {
            SearchMode::EnterValue => 0,
            // the whole address space goes to disk between passes
            SearchMode::SameDifferent => space.total_bytes(),
        };
        ResourceEstimate {
            memory_bytes: total_items / 8,
            disk_bytes,
        }
    }
}

impl fmt::Display for ResourceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "memory: {}, disk: {}",
            format_byte_size(self.memory_bytes),
            format_byte_size(self.disk_bytes)
        )
    }
}

/// Human-readable byte count: `0`, `512B`, `1.5KB`, `2.0MB`, `1.2GB`
pub fn format_byte_size(bytes: u64) -> String {
    const KB: u64 = 1 << 10;
    const MB: u64 = 1 << 20;
    const GB: u64 = 1 << 30;

    match bytes {
        0 => "0".to_string(),
        b if b < KB => format!("{}B", b),
        b if b < MB => format!("{:.1}KB", b as f64 / KB as f64),
        b if b < GB => format!("{:.1}MB", b as f64 / MB as f64),
        b => format!("{:.1}GB", b as f64 / GB as f64),
    }
}

/// Where each region's items start in the bit index space
#[derive(Debug, Clone)]
struct ItemLayout {
    width: u64,
    bases: Vec<Address>,
    /// First item index of each region, plus the total item count at the end
    starts: Vec<u64>,
}

impl ItemLayout {
    fn new(space: &AddressSpace, width: u64) -> Self {
        let mut starts = Vec::with_capacity(space.len() + 1);
        let mut next = 0u64;
        for region in space {
            starts.push(next);
            next += region.size / width;
        }
        starts.push(next);
        ItemLayout {
            width,
            bases: space.iter().map(|r| r.base).collect(),
            starts,
        }
    }

    fn total_items(&self) -> u64 {
        self.starts.last().copied().unwrap_or(0)
    }

    fn region_end(&self, region: usize) -> u64 {
        self.starts[region + 1]
    }

    fn address_of(&self, region: usize, index: u64) -> Address {
        self.bases[region].add((index - self.starts[region]) * self.width)
    }
}

/// A run of items read with one access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub address: Address,
    pub first_index: u64,
    pub end_index: u64,
}

impl Chunk {
    pub fn byte_len(&self, width: u64) -> usize {
        ((self.end_index - self.first_index) * width) as usize
    }
}

/// Walks the chunks that still hold live candidates.
///
/// Chunks are aligned to their region's base and never cross a region
/// boundary. The cursor holds no borrow so the bitset can be edited
/// between steps, as long as bits at or past the cursor are left alone.
#[derive(Debug)]
pub(crate) struct ChunkCursor {
    chunk_items: u64,
    region: usize,
    next_index: u64,
}

impl ChunkCursor {
    pub fn new(chunk_size: usize, width: u64) -> Self {
        ChunkCursor {
            chunk_items: (chunk_size as u64 / width).max(1),
            region: 0,
            next_index: 0,
        }
    }

    fn next_chunk(&mut self, layout: &ItemLayout, bits: &CandidateBits) -> Option<Chunk> {
        let index = bits.next_set(self.next_index)?;
        while layout.region_end(self.region) <= index {
            self.region += 1;
        }

        let region_start = layout.starts[self.region];
        let chunk_no = (index - region_start) / self.chunk_items;
        let first_index = region_start + chunk_no * self.chunk_items;
        let end_index = (first_index + self.chunk_items).min(layout.region_end(self.region));
        self.next_index = end_index;

        Some(Chunk {
            address: layout.address_of(self.region, first_index),
            first_index,
            end_index,
        })
    }
}

/// Ascending addresses of live candidates
pub struct Candidates<'a> {
    session: &'a SearchSession,
    region: usize,
    next_index: u64,
}

impl Iterator for Candidates<'_> {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        let layout = &self.session.layout;
        let index = self.session.bits.next_set(self.next_index)?;
        while layout.region_end(self.region) <= index {
            self.region += 1;
        }
        self.next_index = index + 1;
        Some(layout.address_of(self.region, index))
    }
}

/// An in-progress search over one address space
#[derive(Debug, Clone)]
pub struct SearchSession {
    space: AddressSpace,
    data_type: DataType,
    layout: ItemLayout,
    bits: CandidateBits,
    passes: u32,
}

impl SearchSession {
    /// Starts a value search with every item as a candidate
    pub fn start(space: AddressSpace, data_type: DataType) -> MemoryResult<Self> {
        Self::start_with_mode(space, data_type, SearchMode::EnterValue)
    }

    pub fn start_with_mode(
        space: AddressSpace,
        data_type: DataType,
        mode: SearchMode,
    ) -> MemoryResult<Self> {
        if mode != SearchMode::EnterValue {
            return Err(MemoryError::UnsupportedOperation(format!(
                "{} search is not supported",
                mode
            )));
        }

        let width = data_type.size() as u64;
        if space.total_bytes() % SPACE_ALIGNMENT != 0 {
            return Err(MemoryError::MisalignedAddressSpace(format!(
                "total size {:#x} is not a multiple of {} bytes",
                space.total_bytes(),
                SPACE_ALIGNMENT
            )));
        }
        if let Some(region) = space.iter().find(|r| r.size % width != 0) {
            return Err(MemoryError::MisalignedAddressSpace(format!(
                "region at {} of size {:#x} is not a multiple of the {}-byte {} width",
                region.base, region.size, width, data_type
            )));
        }

        let layout = ItemLayout::new(&space, width);
        let bits = CandidateBits::new_filled(layout.total_items())?;
        info!(
            pid = ?space.pid(),
            %data_type,
            candidates = bits.len(),
            bitset_bytes = bits.byte_size(),
            "started search"
        );

        Ok(SearchSession {
            space,
            data_type,
            layout,
            bits,
            passes: 0,
        })
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.space
    }

    /// Process the searched space was read from
    pub fn pid(&self) -> Option<ProcessId> {
        self.space.pid()
    }

    /// Number of passes applied so far
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Items in the address space, live or not
    pub fn total_items(&self) -> u64 {
        self.bits.len()
    }

    /// Number of live candidates
    pub fn count(&self) -> u64 {
        self.bits.count()
    }

    pub(crate) fn bits(&self) -> &CandidateBits {
        &self.bits
    }

    pub(crate) fn chunk_cursor(&self, chunk_size: usize) -> ChunkCursor {
        ChunkCursor::new(chunk_size, self.layout.width)
    }

    pub(crate) fn next_chunk(&self, cursor: &mut ChunkCursor) -> Option<Chunk> {
        cursor.next_chunk(&self.layout, &self.bits)
    }

    /// Eliminates every candidate not currently equal to `value`.
    ///
    /// Items that cannot be read in full count as not equal. Returns the
    /// number of candidates left.
    pub fn apply_value<A: MemoryAccess + ?Sized>(
        &mut self,
        access: &mut A,
        value: &TypedValue,
        chunk_size: usize,
    ) -> MemoryResult<u64> {
        if value.data_type() != self.data_type {
            return Err(MemoryError::UnsupportedOperation(format!(
                "can't search {} items for a {} value",
                self.data_type,
                value.data_type()
            )));
        }

        let width = self.layout.width;
        let before = self.count();
        let mut cursor = self.chunk_cursor(chunk_size);
        let mut buf = vec![0u8; (cursor.chunk_items * width) as usize];
        let mut chunks_read = 0u64;

        while let Some(chunk) = cursor.next_chunk(&self.layout, &self.bits) {
            let buf = &mut buf[..chunk.byte_len(width)];
            let n = access.read_zero_filled(chunk.address, buf) as u64;
            let covered_end = chunk.first_index + n / width;
            chunks_read += 1;

            let mut from = chunk.first_index;
            while let Some(index) = self.bits.next_set_before(from, chunk.end_index) {
                let offset = ((index - chunk.first_index) * width) as usize;
                if index >= covered_end || !value.matches(&buf[offset..]) {
                    self.bits.clear(index);
                }
                from = index + 1;
            }
        }

        self.passes += 1;
        let after = self.count();
        debug!(pass = self.passes, chunks_read, "search pass scanned");
        info!(
            pass = self.passes,
            value = %value,
            before,
            after,
            "applied search pass"
        );
        Ok(after)
    }

    // Bit index of the item starting exactly at `address`.
    fn index_of(&self, address: Address) -> Option<u64> {
        let (region, r) = self.space.region_containing(address)?;
        let offset = address.offset_from(r.base)?;
        if offset % self.layout.width != 0 {
            return None;
        }
        let index = self.layout.starts[region] + offset / self.layout.width;
        (index < self.layout.region_end(region)).then_some(index)
    }

    /// Whether the item at `address` is still a candidate
    pub fn contains(&self, address: Address) -> bool {
        self.index_of(address).is_some_and(|i| self.bits.get(i))
    }

    /// Drops one candidate.
    ///
    /// Returns false if `address` is outside every region, not the start of
    /// an item, or was already eliminated.
    pub fn remove(&mut self, address: Address) -> bool {
        match self.index_of(address) {
            Some(index) => self.bits.clear(index),
            None => false,
        }
    }

    /// Live candidates in ascending address order
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates {
            session: self,
            region: 0,
            next_index: 0,
        }
    }

    /// The first `limit` live candidates
    pub fn iterate(&self, limit: usize) -> Vec<Address> {
        self.candidates().take(limit).collect()
    }
}
