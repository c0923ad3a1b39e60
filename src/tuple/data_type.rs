use std::fmt;

use crate::common::DEFAULT_STRING_LEN;

/// Field types supported by the storage engine.
/// Every type is fixed width so that all records of one schema occupy the same
/// number of bytes on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer: 4 bytes, big-endian
    Integer,

    /// Character string of at most n bytes.
    /// Stored as: length (4 bytes, big-endian) + exactly n bytes, zero padded
    VarChar(u16),
}

impl DataType {
    /// A string column using the default payload length.
    pub fn string() -> Self {
        DataType::VarChar(DEFAULT_STRING_LEN)
    }

    /// Returns the number of bytes a value of this type occupies on a page.
    pub fn size(&self) -> usize {
        match self {
            DataType::Integer => 4,
            DataType::VarChar(n) => 4 + *n as usize,
        }
    }

    /// Returns true for the textual type.
    pub fn is_textual(&self) -> bool {
        matches!(self, DataType::VarChar(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INT"),
            DataType::VarChar(n) => write!(f, "STRING({})", n),
        }
    }
}
