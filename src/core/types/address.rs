//! Memory address wrapper type with hex parsing

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An absolute address in the target process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Adds a byte offset, wrapping at the top of the address space
    pub const fn add(&self, bytes: u64) -> Self {
        Address(self.0.wrapping_add(bytes))
    }

    /// Adds a byte offset, failing on overflow
    pub fn checked_add(&self, bytes: u64) -> MemoryResult<Self> {
        self.0
            .checked_add(bytes)
            .map(Address)
            .ok_or_else(|| MemoryError::InvalidAddress(format!("{} + {:#x} overflows", self, bytes)))
    }

    /// Byte distance from `base` to this address, if it is not below `base`
    pub const fn offset_from(&self, base: Address) -> Option<u64> {
        self.0.checked_sub(base.0)
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    /// Addresses are always hexadecimal, with or without a `0x`/`$` prefix,
    /// matching the way `/proc/<pid>/maps` prints them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .or_else(|| s.strip_prefix('$'))
            .unwrap_or(s);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MemoryError::InvalidAddress(s.to_string()));
        }

        u64::from_str_radix(digits, 16)
            .map(Address::new)
            .map_err(|_| MemoryError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value as u64)
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}
