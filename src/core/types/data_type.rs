//! Supported item encodings and their static dispatch table

use super::error::MemoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the bytes of an item are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Unsigned,
    Signed,
    Float,
    /// A text code unit; `max` is the largest accepted code value
    Character { max: u32 },
}

/// Static description of a [`DataType`]
#[derive(Debug)]
pub struct TypeInfo {
    pub name: &'static str,
    pub size: usize,
    pub kind: TypeKind,
}

/// The item types a search or memory view can be made over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    U64,
    S64,
    Ascii,
    Utf16,
    Utf32,
    F32,
    F64,
}

// Indexed by `DataType as usize`; keep in declaration order.
static TYPE_TABLE: [TypeInfo; 13] = [
    TypeInfo { name: "u8", size: 1, kind: TypeKind::Unsigned },
    TypeInfo { name: "s8", size: 1, kind: TypeKind::Signed },
    TypeInfo { name: "u16", size: 2, kind: TypeKind::Unsigned },
    TypeInfo { name: "s16", size: 2, kind: TypeKind::Signed },
    TypeInfo { name: "u32", size: 4, kind: TypeKind::Unsigned },
    TypeInfo { name: "s32", size: 4, kind: TypeKind::Signed },
    TypeInfo { name: "u64", size: 8, kind: TypeKind::Unsigned },
    TypeInfo { name: "s64", size: 8, kind: TypeKind::Signed },
    TypeInfo { name: "ascii", size: 1, kind: TypeKind::Character { max: 0x7F } },
    TypeInfo { name: "utf16", size: 2, kind: TypeKind::Character { max: 0xFFFF } },
    TypeInfo { name: "utf32", size: 4, kind: TypeKind::Character { max: u32::MAX } },
    TypeInfo { name: "f32", size: 4, kind: TypeKind::Float },
    TypeInfo { name: "f64", size: 8, kind: TypeKind::Float },
];

impl DataType {
    /// Every supported type, in table order
    pub const ALL: [DataType; 13] = [
        DataType::U8,
        DataType::S8,
        DataType::U16,
        DataType::S16,
        DataType::U32,
        DataType::S32,
        DataType::U64,
        DataType::S64,
        DataType::Ascii,
        DataType::Utf16,
        DataType::Utf32,
        DataType::F32,
        DataType::F64,
    ];

    /// Static description of this type
    pub fn info(self) -> &'static TypeInfo {
        &TYPE_TABLE[self as usize]
    }

    /// Width of one item in bytes (1, 2, 4 or 8)
    pub fn size(self) -> usize {
        self.info().size
    }

    /// Short lowercase name, e.g. `u32` or `utf16`
    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn kind(self) -> TypeKind {
        self.info().kind
    }

    pub fn is_character(self) -> bool {
        matches!(self.kind(), TypeKind::Character { .. })
    }

    /// Looks a type up by its short name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Byte-wise comparison of exactly `size()` bytes
    pub fn equal(self, a: &[u8], b: &[u8]) -> bool {
        let n = self.size();
        a.len() >= n && b.len() >= n && a[..n] == b[..n]
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::from_name(&s.trim().to_ascii_lowercase()).ok_or_else(|| {
            MemoryError::UnsupportedOperation(format!("unknown data type '{}'", s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_declaration_order() {
        for t in DataType::ALL {
            assert_eq!(DataType::from_name(t.name()), Some(t));
        }
    }

    #[test]
    fn test_sizes() {
        assert_eq!(DataType::U8.size(), 1);
        assert_eq!(DataType::Ascii.size(), 1);
        assert_eq!(DataType::S16.size(), 2);
        assert_eq!(DataType::Utf16.size(), 2);
        assert_eq!(DataType::Utf32.size(), 4);
        assert_eq!(DataType::F32.size(), 4);
        assert_eq!(DataType::S64.size(), 8);
        assert_eq!(DataType::F64.size(), 8);
        for t in DataType::ALL {
            assert!([1, 2, 4, 8].contains(&t.size()));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("u32".parse::<DataType>().unwrap(), DataType::U32);
        assert_eq!("UTF16".parse::<DataType>().unwrap(), DataType::Utf16);
        assert!("i32".parse::<DataType>().is_err());
    }

    #[test]
    fn test_equal_uses_type_width() {
        let a = [1, 2, 3, 4, 5, 6, 7, 8];
        let b = [1, 2, 3, 4, 9, 9, 9, 9];
        assert!(DataType::U32.equal(&a, &b));
        assert!(!DataType::U64.equal(&a, &b));
        assert!(!DataType::U32.equal(&a[..2], &b));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DataType::Utf32).unwrap();
        assert_eq!(json, "\"utf32\"");
        let back: DataType = serde_json::from_str("\"s8\"").unwrap();
        assert_eq!(back, DataType::S8);
    }
}
