//! Control byte encodings of the snapshot format
//!
//! A record is an address control, a length control, then the raw bytes.
//! Addresses are stored as the distance from where the previous run ended
//! (0 before the first run) whenever that fits, and absolute otherwise.

use crate::core::types::SnapshotFormatError;

/// Leading bytes of every snapshot: `FF 'M' 'E' 'M'`
pub const MAGIC: [u8; 4] = [0xFF, b'M', b'E', b'M'];

/// Largest delta stored in the control byte itself
pub const MAX_SHORT_DELTA: u64 = 0x3F;
/// Largest delta stored in the control byte plus one extra byte
pub const MAX_MEDIUM_DELTA: u64 = 0x1FFF;
/// Largest length stored in the control byte itself
pub const MAX_SHORT_LENGTH: u64 = 0x3F;

const ADDRESS_MEDIUM: u8 = 0x40;
const ADDRESS_ABSOLUTE: u8 = 0x60;
const LENGTH_SHORT: u8 = 0x80;
const LENGTH_U16: u8 = 0xC0;
const LENGTH_U64: u8 = 0xE0;

/// A decoded address control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressControl {
    /// Delta fully held in the control byte
    Short(u64),
    /// Low 5 bits of the delta; the next byte holds bits 5..13
    Medium(u8),
    /// An 8-byte little-endian absolute address follows
    Absolute,
}

/// A decoded length control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthControl {
    Short(u64),
    /// A 2-byte little-endian length follows
    U16,
    /// An 8-byte little-endian length follows
    U64,
}

pub fn decode_address_control(b: u8) -> Result<AddressControl, SnapshotFormatError> {
    match b & 0xE0 {
        0x00 | 0x20 => Ok(AddressControl::Short(u64::from(b & 0x3F))),
        ADDRESS_MEDIUM => Ok(AddressControl::Medium(b & 0x1F)),
        _ if b == ADDRESS_ABSOLUTE => Ok(AddressControl::Absolute),
        _ => Err(SnapshotFormatError::InvalidAddressControl(b)),
    }
}

pub fn decode_length_control(b: u8) -> Result<LengthControl, SnapshotFormatError> {
    match b & 0xE0 {
        0x80 | 0xA0 => Ok(LengthControl::Short(u64::from(b & 0x3F))),
        _ if b == LENGTH_U16 => Ok(LengthControl::U16),
        _ if b == LENGTH_U64 => Ok(LengthControl::U64),
        _ => Err(SnapshotFormatError::InvalidLengthControl(b)),
    }
}

/// Appends the shortest address encoding of `address` given the previous end
pub fn encode_address(out: &mut Vec<u8>, prev_end: u64, address: u64) {
    match address.checked_sub(prev_end) {
        Some(delta) if delta <= MAX_SHORT_DELTA => out.push(delta as u8),
        Some(delta) if delta <= MAX_MEDIUM_DELTA => {
            out.push(ADDRESS_MEDIUM | (delta & 0x1F) as u8);
            out.push((delta >> 5) as u8);
        }
        _ => {
            out.push(ADDRESS_ABSOLUTE);
            out.extend_from_slice(&address.to_le_bytes());
        }
    }
}

/// Appends the shortest length encoding of `len`
pub fn encode_length(out: &mut Vec<u8>, len: u64) {
    if len <= MAX_SHORT_LENGTH {
        out.push(LENGTH_SHORT | len as u8);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(LENGTH_U16);
        out.extend_from_slice(&len.to_le_bytes());
    } else {
        out.push(LENGTH_U64);
        out.extend_from_slice(&len.to_le_bytes());
    }
}
