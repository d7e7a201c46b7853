//! Typed values: raw item bytes tagged with their [`DataType`]

use super::character;
use super::data_type::{DataType, TypeKind};
use super::error::{MemoryError, MemoryResult};
use std::fmt;

/// Maximum width of any supported item
pub const MAX_VALUE_SIZE: usize = 8;

/// A single item's bytes in target byte order.
///
/// Only the first `data_type.size()` bytes are meaningful; the rest are
/// always zero so the buffer can be compared and copied as a whole.
#[derive(Clone, Copy)]
pub struct TypedValue {
    data_type: DataType,
    bytes: [u8; MAX_VALUE_SIZE],
}

impl TypedValue {
    /// Builds a value from the leading `data_type.size()` bytes of `bytes`.
    ///
    /// Returns `None` if fewer bytes are available.
    pub fn from_bytes(data_type: DataType, bytes: &[u8]) -> Option<Self> {
        let n = data_type.size();
        let src = bytes.get(..n)?;
        let mut buf = [0u8; MAX_VALUE_SIZE];
        buf[..n].copy_from_slice(src);
        Some(TypedValue {
            data_type,
            bytes: buf,
        })
    }

    /// Parses user-entered text.
    ///
    /// Numbers must consume the whole input; character types accept one
    /// character, a named escape or a `\x` hex escape within the type's range.
    pub fn parse(data_type: DataType, text: &str) -> MemoryResult<Self> {
        let bytes: Vec<u8> = match data_type {
            DataType::U8 => parse_num::<u8>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::S8 => parse_num::<i8>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::U16 => parse_num::<u16>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::S16 => parse_num::<i16>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::U32 => parse_num::<u32>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::S32 => parse_num::<i32>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::U64 => parse_num::<u64>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::S64 => parse_num::<i64>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::F32 => parse_num::<f32>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::F64 => parse_num::<f64>(data_type, text)?.to_ne_bytes().to_vec(),
            DataType::Ascii | DataType::Utf16 | DataType::Utf32 => {
                let code = character::code_from_str(text).ok_or_else(|| {
                    MemoryError::parse(data_type, text, "expected a character or escape")
                })?;
                let max = character_max(data_type);
                if code > max {
                    return Err(MemoryError::parse(
                        data_type,
                        text,
                        format!("code {:#x} exceeds {:#x}", code, max),
                    ));
                }
                match data_type.size() {
                    1 => vec![code as u8],
                    2 => (code as u16).to_ne_bytes().to_vec(),
                    _ => code.to_ne_bytes().to_vec(),
                }
            }
        };

        TypedValue::from_bytes(data_type, &bytes)
            .ok_or_else(|| MemoryError::parse(data_type, text, "internal width mismatch"))
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The meaningful bytes, exactly `data_type().size()` long
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.data_type.size()]
    }

    /// The value widened to a code value, for character types
    fn code(&self) -> u32 {
        let b = self.bytes;
        match self.data_type.size() {
            1 => b[0] as u32,
            2 => u16::from_ne_bytes([b[0], b[1]]) as u32,
            _ => u32::from_ne_bytes([b[0], b[1], b[2], b[3]]),
        }
    }

    /// Canonical display text; parsing it back yields the same bytes
    pub fn format(&self) -> String {
        let b = self.bytes;
        let b2 = [b[0], b[1]];
        let b4 = [b[0], b[1], b[2], b[3]];
        match self.data_type {
            DataType::U8 => b[0].to_string(),
            DataType::S8 => (b[0] as i8).to_string(),
            DataType::U16 => u16::from_ne_bytes(b2).to_string(),
            DataType::S16 => i16::from_ne_bytes(b2).to_string(),
            DataType::U32 => u32::from_ne_bytes(b4).to_string(),
            DataType::S32 => i32::from_ne_bytes(b4).to_string(),
            DataType::U64 => u64::from_ne_bytes(b).to_string(),
            DataType::S64 => i64::from_ne_bytes(b).to_string(),
            DataType::F32 => f32::from_ne_bytes(b4).to_string(),
            DataType::F64 => f64::from_ne_bytes(b).to_string(),
            DataType::Ascii | DataType::Utf16 | DataType::Utf32 => {
                character::code_to_string(self.code(), character_max(self.data_type))
            }
        }
    }

    /// Byte-wise equality against raw memory
    pub fn matches(&self, bytes: &[u8]) -> bool {
        self.data_type.equal(self.as_bytes(), bytes)
    }
}

fn character_max(data_type: DataType) -> u32 {
    match data_type.kind() {
        TypeKind::Character { max } => max,
        _ => u32::MAX,
    }
}

fn parse_num<T: std::str::FromStr>(data_type: DataType, text: &str) -> MemoryResult<T>
where
    T::Err: fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| MemoryError::parse(data_type, text, e.to_string()))
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for TypedValue {}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedValue")
            .field("type", &self.data_type)
            .field("bytes", &self.as_bytes())
            .field("display", &self.format())
            .finish()
    }
}
