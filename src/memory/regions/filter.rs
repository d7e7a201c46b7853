//! Memory region filtering functionality

use crate::memory::regions::MemoryRegion;

/// Criteria for filtering memory regions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Filter by minimum size
    pub min_size: Option<u64>,
    /// Filter by readable regions only
    pub readable_only: bool,
    /// Filter by writable regions only
    pub writable_only: bool,
    /// Filter by private (copy-on-write) regions only
    pub private_only: bool,
    /// Exclude executable regions
    pub exclude_executable: bool,
}

impl FilterCriteria {
    /// Create a new filter criteria builder
    pub fn new() -> Self {
        FilterCriteria::default()
    }

    /// Set minimum size filter
    pub fn with_min_size(mut self, size: u64) -> Self {
        self.min_size = Some(size);
        self
    }

    /// Filter for readable regions only
    pub fn readable(mut self) -> Self {
        self.readable_only = true;
        self
    }

    /// Filter for writable regions only
    pub fn writable(mut self) -> Self {
        self.writable_only = true;
        self
    }

    /// Filter for private regions only
    pub fn private(mut self) -> Self {
        self.private_only = true;
        self
    }

    /// Drop executable regions
    pub fn non_executable(mut self) -> Self {
        self.exclude_executable = true;
        self
    }
}

/// Filter for memory regions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFilter {
    criteria: FilterCriteria,
}

impl RegionFilter {
    /// Create a new region filter with the given criteria
    pub fn new(criteria: FilterCriteria) -> Self {
        RegionFilter { criteria }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Apply the filter to a list of regions
    pub fn apply(&self, regions: &[MemoryRegion]) -> Vec<MemoryRegion> {
        regions
            .iter()
            .filter(|region| self.matches(region))
            .cloned()
            .collect()
    }

    /// Check if a region matches the filter criteria
    pub fn matches(&self, region: &MemoryRegion) -> bool {
        let c = &self.criteria;
        let perms = &region.permissions;

        if let Some(min) = c.min_size {
            if region.size < min {
                return false;
            }
        }

        if c.readable_only && !perms.is_readable() {
            return false;
        }
        if c.writable_only && !perms.is_writable() {
            return false;
        }
        if c.private_only && !perms.is_private() {
            return false;
        }
        if c.exclude_executable && perms.is_executable() {
            return false;
        }

        true
    }
}

impl Default for RegionFilter {
    /// Exactly `rw-p` regions
    fn default() -> Self {
        RegionFilter::new(presets::writable_private())
    }
}

/// Common filter presets
pub mod presets {
    use super::*;

    /// `rw-p`: heap, stack, anonymous and data segment mappings
    pub fn writable_private() -> FilterCriteria {
        FilterCriteria::new()
            .readable()
            .writable()
            .private()
            .non_executable()
    }
}
