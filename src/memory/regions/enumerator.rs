//! Memory region enumeration from `/proc/<pid>/maps`

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::regions::Permissions;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// One mapping of the target's address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRegion {
    /// Base address of the region
    pub base: Address,
    /// Size of the region in bytes
    pub size: u64,
    pub permissions: Permissions,
    /// Offset into the mapped file
    pub offset: u64,
    /// Backing file or pseudo-name such as `[heap]`
    pub pathname: Option<String>,
}

impl MemoryRegion {
    /// An anonymous `rw-p` region
    pub fn new(base: Address, size: u64) -> Self {
        MemoryRegion {
            base,
            size,
            permissions: Permissions::READ_WRITE_PRIVATE,
            offset: 0,
            pathname: None,
        }
    }

    /// One past the last byte of the region
    pub fn end(&self) -> Address {
        self.base.add(self.size)
    }

    pub fn contains(&self, address: Address) -> bool {
        address >= self.base && address.as_u64() - self.base.as_u64() < self.size
    }
}

/// Path of the maps file for `pid`
pub fn maps_path(pid: ProcessId) -> PathBuf {
    PathBuf::from(format!("/proc/{}/maps", pid))
}

// Splits off the next whitespace-delimited field.
fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (field, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(field)
}

/// Parses one line of a maps file.
///
/// `lo-hi perms offset dev inode [pathname]`; `None` if the line does not
/// have that shape.
pub fn parse_map_line(line: &str) -> Option<MemoryRegion> {
    let mut rest = line;
    let range = next_field(&mut rest)?;
    let permissions = next_field(&mut rest)?.parse::<Permissions>().ok()?;
    let offset = u64::from_str_radix(next_field(&mut rest)?, 16).ok()?;
    let _device = next_field(&mut rest)?;
    let _inode = next_field(&mut rest)?;

    let (lo, hi) = range.split_once('-')?;
    let lo = u64::from_str_radix(lo, 16).ok()?;
    let hi = u64::from_str_radix(hi, 16).ok()?;
    let size = hi.checked_sub(lo)?;

    let pathname = rest.trim();
    Some(MemoryRegion {
        base: Address::new(lo),
        size,
        permissions,
        offset,
        pathname: (!pathname.is_empty()).then(|| pathname.to_string()),
    })
}

/// Parses a whole maps file, preserving order and skipping malformed lines
pub fn parse_maps(contents: &str) -> Vec<MemoryRegion> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let region = parse_map_line(line);
            if region.is_none() {
                debug!("skipping malformed maps line: {:?}", line);
            }
            region
        })
        .collect()
}

/// Reads and parses every mapping of `pid`
pub fn read_maps(pid: ProcessId) -> MemoryResult<Vec<MemoryRegion>> {
    let path = maps_path(pid);
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| MemoryError::unreachable(pid, format!("couldn't open {}: {}", path.display(), e)))?;
    Ok(parse_maps(&contents))
}
