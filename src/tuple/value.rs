use std::fmt;

use bytes::{Buf, BufMut};

use crate::common::{DbError, Result};

use super::DataType;

/// Represents a typed value that can be stored in a tuple.
/// Values are totally ordered and hashable so they can serve as
/// comparison operands and group keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// 32-bit signed integer
    Integer(i32),

    /// String value
    String(String),
}

impl Value {
    /// Checks that this value fits a column of the given type.
    pub fn check(&self, data_type: &DataType) -> Result<()> {
        match (self, data_type) {
            (Value::Integer(_), DataType::Integer) => Ok(()),
            (Value::String(s), DataType::VarChar(n)) => {
                if s.len() > *n as usize {
                    Err(DbError::ValueTooLong {
                        len: s.len(),
                        max: *n as usize,
                    })
                } else {
                    Ok(())
                }
            }
            _ => Err(DbError::TypeMismatch {
                expected: data_type.to_string(),
                found: self.type_name().to_string(),
            }),
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::String(_) => None,
        }
    }

    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Integer(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INT",
            Value::String(_) => "STRING",
        }
    }

    /// Writes the value in its fixed-width on-page encoding.
    /// The value must already have passed `check` against `data_type`.
    pub fn write_to<B: BufMut>(&self, buf: &mut B, data_type: &DataType) {
        match (self, data_type) {
            (Value::Integer(v), DataType::Integer) => buf.put_i32(*v),
            (Value::String(s), DataType::VarChar(n)) => {
                let n = *n as usize;
                let bytes = s.as_bytes();
                let len = bytes.len().min(n);
                buf.put_i32(len as i32);
                buf.put_slice(&bytes[..len]);
                buf.put_bytes(0, n - len);
            }
            // Mismatched pairs are rejected when the tuple is built
            _ => buf.put_bytes(0, data_type.size()),
        }
    }

    /// Reads a value of the given type from its fixed-width encoding.
    /// Returns None if the buffer holds fewer bytes than the type's width.
    pub fn read_from<B: Buf>(buf: &mut B, data_type: &DataType) -> Option<Self> {
        if buf.remaining() < data_type.size() {
            return None;
        }

        match data_type {
            DataType::Integer => Some(Value::Integer(buf.get_i32())),
            DataType::VarChar(n) => {
                let n = *n as usize;
                let len = (buf.get_i32().max(0) as usize).min(n);
                let mut payload = vec![0u8; n];
                buf.copy_to_slice(&mut payload);
                payload.truncate(len);
                Some(Value::String(String::from_utf8_lossy(&payload).into_owned()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
