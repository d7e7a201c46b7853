//! Memory region management for Linux processes
//!
//! This module reads a process's mappings from `/proc/<pid>/maps`, filters
//! them down to the regions worth searching (by default exactly the
//! privately writable, non-executable ones) and keeps them as an ordered
//! [`AddressSpace`].

pub mod enumerator;
pub mod filter;
pub mod protection;

pub use enumerator::{maps_path, parse_map_line, parse_maps, read_maps, MemoryRegion};
pub use filter::{presets, FilterCriteria, RegionFilter};
pub use protection::Permissions;

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use serde::Serialize;
use tracing::debug;

/// The regions of one process that searches and dumps operate on.
///
/// Regions are kept in ascending base order as the kernel lists them and
/// are never coalesced. Item `i` of a search is the `i`-th item in that
/// order across the concatenated regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressSpace {
    pid: Option<ProcessId>,
    regions: Vec<MemoryRegion>,
    total_bytes: u64,
}

impl AddressSpace {
    /// Builds a space not tied to any process
    pub fn from_regions(mut regions: Vec<MemoryRegion>) -> Self {
        regions.sort_by_key(|r| r.base);
        let total_bytes = regions.iter().map(|r| r.size).sum();
        AddressSpace {
            pid: None,
            regions,
            total_bytes,
        }
    }

    /// Reads the current mappings of `pid` and keeps the ones `filter` accepts
    pub fn refresh(pid: ProcessId, filter: &RegionFilter) -> MemoryResult<Self> {
        let all = read_maps(pid)?;
        let kept = filter.apply(&all);
        if kept.is_empty() {
            return Err(MemoryError::EmptyAddressSpace { pid });
        }

        let space = AddressSpace {
            pid: Some(pid),
            ..AddressSpace::from_regions(kept)
        };
        debug!(
            pid,
            regions = space.len(),
            total_bytes = space.total_bytes,
            skipped = all.len() - space.len(),
            "refreshed address space"
        );
        Ok(space)
    }

    /// Ties the space to `pid`
    pub fn with_pid(mut self, pid: ProcessId) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn pid(&self) -> Option<ProcessId> {
        self.pid
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemoryRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Sum of all region sizes
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Index and region holding `address`
    pub fn region_containing(&self, address: Address) -> Option<(usize, &MemoryRegion)> {
        // first region whose end is past `address`
        let idx = self.regions.partition_point(|r| r.end() <= address);
        let region = self.regions.get(idx)?;
        region.contains(address).then_some((idx, region))
    }
}

impl<'a> IntoIterator for &'a AddressSpace {
    type Item = &'a MemoryRegion;
    type IntoIter = std::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> AddressSpace {
        AddressSpace::from_regions(vec![
            MemoryRegion::new(Address::new(0x3000), 0x100),
            MemoryRegion::new(Address::new(0x1000), 0x200),
            MemoryRegion::new(Address::new(0x1200), 0),
        ])
    }

    #[test]
    fn test_from_regions_sorts_and_totals() {
        let space = space();
        assert_eq!(space.len(), 3);
        assert_eq!(space.total_bytes(), 0x300);
        assert_eq!(space.pid(), None);
        let bases: Vec<u64> = space.iter().map(|r| r.base.as_u64()).collect();
        assert_eq!(bases, vec![0x1000, 0x1200, 0x3000]);
    }

    #[test]
    fn test_region_containing() {
        let space = space();
        assert_eq!(space.region_containing(Address::new(0x1000)).map(|(i, _)| i), Some(0));
        assert_eq!(space.region_containing(Address::new(0x11FF)).map(|(i, _)| i), Some(0));
        // the empty region holds nothing
        assert_eq!(space.region_containing(Address::new(0x1200)), None);
        assert_eq!(space.region_containing(Address::new(0x2000)), None);
        assert_eq!(space.region_containing(Address::new(0x30FF)).map(|(i, _)| i), Some(2));
        assert_eq!(space.region_containing(Address::new(0x3100)), None);
        assert_eq!(space.region_containing(Address::new(0)), None);
    }

    #[test]
    fn test_refresh_missing_process() {
        let err = AddressSpace::refresh(i32::MAX, &RegionFilter::default()).unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    #[cfg_attr(miri, ignore = "procfs not supported in Miri")]
    fn test_refresh_self() {
        let pid = std::process::id() as ProcessId;
        let space = AddressSpace::refresh(pid, &RegionFilter::default()).unwrap();
        assert_eq!(space.pid(), Some(pid));
        assert!(!space.is_empty());
        assert_eq!(space.total_bytes(), space.iter().map(|r| r.size).sum::<u64>());
        assert!(space.iter().all(|r| r.permissions == Permissions::READ_WRITE_PRIVATE));
    }

    #[test]
    fn test_empty_filter_result() {
        let filter = RegionFilter::new(FilterCriteria::new().with_min_size(u64::MAX));
        let pid = std::process::id() as ProcessId;
        match AddressSpace::refresh(pid, &filter) {
            Err(MemoryError::EmptyAddressSpace { pid: p }) => assert_eq!(p, pid),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
