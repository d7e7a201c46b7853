//! One entry point per user action against a target process

use crate::config::Config;
use crate::core::types::{Address, DataType, MemoryError, MemoryResult, ProcessId, TypedValue, MAX_VALUE_SIZE};
use crate::memory::access::MemoryAccess;
use crate::memory::regions::{AddressSpace, RegionFilter};
use crate::memory::search::{SearchSession, DEFAULT_CHUNK_SIZE};
use crate::memory::snapshot::{self, LoadSummary, SnapshotSummary};
use crate::process::{AccessMode, ProcessHandle, ProcessInfo, ProcessTarget};
use std::path::Path;

/// Memory operations against one target.
///
/// Every call opens the target's memory, does all of its I/O and closes it
/// again before returning, so the target is never left paused between
/// calls. Once the target turns out to be gone, every call fails fast with
/// [`MemoryError::ProcessUnreachable`].
#[derive(Debug)]
pub struct MemoryOperations {
    target: ProcessTarget,
    filter: RegionFilter,
    chunk_size: usize,
}

impl MemoryOperations {
    /// Operations on `target` with the default `rw-p` filter and chunk size
    pub fn new(target: ProcessTarget) -> Self {
        MemoryOperations {
            target,
            filter: RegionFilter::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Operations on `pid` set up from `config`
    pub fn from_config(pid: ProcessId, config: &Config) -> Self {
        let target = ProcessTarget::new(pid, config.process.stop_while_accessing);
        MemoryOperations::new(target)
            .with_filter(config.regions.filter())
            .with_chunk_size(config.scanner.chunk_size)
    }

    pub fn with_filter(mut self, filter: RegionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn target(&self) -> &ProcessTarget {
        &self.target
    }

    pub fn pid(&self) -> ProcessId {
        self.target.pid()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn process_info(&self) -> ProcessInfo {
        ProcessInfo::from_pid(self.pid())
    }

    // Runs `f` with the target's memory open, closing it on every path.
    fn with_handle<T>(
        &mut self,
        mode: AccessMode,
        f: impl FnOnce(&mut ProcessHandle) -> MemoryResult<T>,
    ) -> MemoryResult<T> {
        let mut handle = self.target.open(mode)?;
        let result = f(&mut handle);
        let closed = handle.close();
        let result = result.and_then(|value| closed.map(|_| value));
        self.target.observe(result)
    }

    fn check_owner(&self, owner: Option<ProcessId>) -> MemoryResult<()> {
        match owner {
            Some(session) if session != self.pid() => Err(MemoryError::SessionMismatch {
                session,
                target: self.pid(),
            }),
            _ => Ok(()),
        }
    }

    /// Re-reads the target's mappings
    pub fn refresh_address_space(&mut self) -> MemoryResult<AddressSpace> {
        self.target.ensure_reachable()?;
        let result = AddressSpace::refresh(self.pid(), &self.filter);
        self.target.observe(result)
    }

    /// Reads `count` consecutive items.
    ///
    /// Items that could not be read in full come back as `None`.
    pub fn read_items(
        &mut self,
        address: Address,
        count: usize,
        data_type: DataType,
    ) -> MemoryResult<Vec<Option<TypedValue>>> {
        let width = data_type.size();
        let len = count.checked_mul(width).ok_or(MemoryError::OutOfMemory { bytes: u64::MAX })?;
        address.checked_add(len as u64)?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| MemoryError::OutOfMemory { bytes: len as u64 })?;
        buf.resize(len, 0);

        let n = self.with_handle(AccessMode::Read, |handle| Ok(handle.read_at(address, &mut buf)))?;
        Ok(buf
            .chunks_exact(width)
            .enumerate()
            .map(|(i, item)| {
                if (i + 1) * width <= n {
                    TypedValue::from_bytes(data_type, item)
                } else {
                    None
                }
            })
            .collect())
    }

    /// Writes one item; anything short of the full width is an error
    pub fn write_item(&mut self, address: Address, value: &TypedValue) -> MemoryResult<()> {
        self.write_bytes(address, value.as_bytes())
    }

    /// Writes raw bytes; anything short of `bytes.len()` is an error
    pub fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        address.checked_add(bytes.len() as u64)?;
        let written = self.with_handle(AccessMode::Write, |handle| Ok(handle.write_at(address, bytes)))?;
        if written < bytes.len() {
            return Err(MemoryError::partial_write(address, bytes.len(), written));
        }
        Ok(())
    }

    /// Starts a search over `space`, which must belong to this target
    pub fn start_search(&mut self, space: AddressSpace, data_type: DataType) -> MemoryResult<SearchSession> {
        self.target.ensure_reachable()?;
        self.check_owner(space.pid())?;
        SearchSession::start(space, data_type)
    }

    /// Runs one elimination pass, returning the candidates left
    pub fn apply_predicate(&mut self, session: &mut SearchSession, value: &TypedValue) -> MemoryResult<u64> {
        self.check_owner(session.pid())?;
        let chunk_size = self.chunk_size;
        self.with_handle(AccessMode::Read, |handle| session.apply_value(handle, value, chunk_size))
    }

    pub fn iterate_candidates(&self, session: &SearchSession, limit: usize) -> MemoryResult<Vec<Address>> {
        self.check_owner(session.pid())?;
        Ok(session.iterate(limit))
    }

    /// The first `limit` live candidates with their current values, all read
    /// under one open of the target.
    ///
    /// Values that could not be read in full come back as `None`.
    pub fn read_candidates(
        &mut self,
        session: &SearchSession,
        limit: usize,
    ) -> MemoryResult<Vec<(Address, Option<TypedValue>)>> {
        self.check_owner(session.pid())?;
        let data_type = session.data_type();
        let addresses = session.iterate(limit);
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        self.with_handle(AccessMode::Read, |handle| {
            let mut buf = [0u8; MAX_VALUE_SIZE];
            let buf = &mut buf[..data_type.size()];
            Ok(addresses
                .into_iter()
                .map(|address| {
                    let value = (handle.read_at(address, buf) == buf.len())
                        .then(|| TypedValue::from_bytes(data_type, buf))
                        .flatten();
                    (address, value)
                })
                .collect())
        })
    }

    pub fn remove_candidate(&self, session: &mut SearchSession, address: Address) -> MemoryResult<bool> {
        self.check_owner(session.pid())?;
        Ok(session.remove(address))
    }

    /// Saves all of `space` to a snapshot file
    pub fn dump_all(&mut self, space: &AddressSpace, path: &Path) -> MemoryResult<SnapshotSummary> {
        self.check_owner(space.pid())?;
        self.with_handle(AccessMode::Read, |handle| snapshot::dump_all_to_path(handle, space, path))
    }

    /// Saves the live candidates of `session` to a snapshot file
    pub fn dump_candidates(&mut self, session: &SearchSession, path: &Path) -> MemoryResult<SnapshotSummary> {
        self.check_owner(session.pid())?;
        let chunk_size = self.chunk_size;
        self.with_handle(AccessMode::Read, |handle| {
            snapshot::dump_candidates_to_path(handle, session, path, chunk_size)
        })
    }

    /// Writes a snapshot file back into the target
    pub fn load(&mut self, path: &Path) -> MemoryResult<LoadSummary> {
        self.with_handle(AccessMode::Write, |handle| snapshot::load_from_path(handle, path))
    }
}
