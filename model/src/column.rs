use std::fmt::{self, Debug};

use bitflags::bitflags;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::debug::DebugBytesRef;

/// Type code of a column as reported by the upstream type catalog.
///
/// The code is opaque to the codec: only the blob, string, integer and float
/// families are told apart, every other code is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnType(pub u8);

impl ColumnType {
  pub const DECIMAL: Self = Self(0x00);
  pub const TINY: Self = Self(0x01);
  pub const SHORT: Self = Self(0x02);
  pub const LONG: Self = Self(0x03);
  pub const FLOAT: Self = Self(0x04);
  pub const DOUBLE: Self = Self(0x05);
  pub const NULL: Self = Self(0x06);
  pub const TIMESTAMP: Self = Self(0x07);
  pub const LONGLONG: Self = Self(0x08);
  pub const INT24: Self = Self(0x09);
  pub const DATE: Self = Self(0x0a);
  pub const DURATION: Self = Self(0x0b);
  pub const DATETIME: Self = Self(0x0c);
  pub const YEAR: Self = Self(0x0d);
  pub const NEW_DATE: Self = Self(0x0e);
  pub const VARCHAR: Self = Self(0x0f);
  pub const BIT: Self = Self(0x10);
  pub const JSON: Self = Self(0xf5);
  pub const NEW_DECIMAL: Self = Self(0xf6);
  pub const ENUM: Self = Self(0xf7);
  pub const SET: Self = Self(0xf8);
  pub const TINY_BLOB: Self = Self(0xf9);
  pub const MEDIUM_BLOB: Self = Self(0xfa);
  pub const LONG_BLOB: Self = Self(0xfb);
  pub const BLOB: Self = Self(0xfc);
  pub const VAR_STRING: Self = Self(0xfd);
  pub const STRING: Self = Self(0xfe);
  pub const GEOMETRY: Self = Self(0xff);

  pub fn code(self) -> u8 {
    self.0
  }

  pub fn is_blob(self) -> bool {
    matches!(self, Self::TINY_BLOB | Self::MEDIUM_BLOB | Self::LONG_BLOB | Self::BLOB)
  }

  /// Character types whose binary-ness is decided by the `BINARY` flag alone.
  pub fn is_string(self) -> bool {
    matches!(self, Self::VARCHAR | Self::VAR_STRING | Self::STRING)
  }

  pub fn is_integer(self) -> bool {
    matches!(
      self,
      Self::TINY | Self::SHORT | Self::LONG | Self::LONGLONG | Self::INT24 | Self::YEAR | Self::BIT
    )
  }

  pub fn is_float(self) -> bool {
    matches!(self, Self::FLOAT | Self::DOUBLE)
  }
}

impl From<u8> for ColumnType {
  fn from(code: u8) -> Self {
    Self(code)
  }
}

impl fmt::Display for ColumnType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x{:02x}", self.0)
  }
}

bitflags! {
  /// Per-column flags attached by the capture layer.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
  pub struct ColumnFlags: u64 {
    const BINARY = 1 << 0;
    const HANDLE_KEY = 1 << 1;
    const GENERATED = 1 << 2;
    const PRIMARY_KEY = 1 << 3;
    const UNIQUE_KEY = 1 << 4;
    const MULTIPLE_KEY = 1 << 5;
    const NULLABLE = 1 << 6;
    const UNSIGNED = 1 << 7;
  }
}

impl Default for ColumnFlags {
  fn default() -> Self {
    Self::empty()
  }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
  Null,
  I64(i64),
  U64(u64),
  F64(f64),
  String(String),
  Bytes(Bytes),
}

impl ColumnValue {
  pub fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }

  /// Name of the variant, used in error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::I64(_) => "int",
      Self::U64(_) => "uint",
      Self::F64(_) => "float",
      Self::String(_) => "string",
      Self::Bytes(_) => "binary",
    }
  }
}

impl Debug for ColumnValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("Null"),
      Self::I64(v) => f.debug_tuple("I64").field(v).finish(),
      Self::U64(v) => f.debug_tuple("U64").field(v).finish(),
      Self::F64(v) => f.debug_tuple("F64").field(v).finish(),
      Self::String(v) => f.debug_tuple("String").field(v).finish(),
      Self::Bytes(v) => f.debug_tuple("Bytes").field(&DebugBytesRef(v)).finish(),
    }
  }
}

impl From<i64> for ColumnValue {
  fn from(v: i64) -> Self {
    Self::I64(v)
  }
}

impl From<u64> for ColumnValue {
  fn from(v: u64) -> Self {
    Self::U64(v)
  }
}

impl From<f64> for ColumnValue {
  fn from(v: f64) -> Self {
    Self::F64(v)
  }
}

impl From<&str> for ColumnValue {
  fn from(v: &str) -> Self {
    Self::String(v.to_string())
  }
}

impl From<String> for ColumnValue {
  fn from(v: String) -> Self {
    Self::String(v)
  }
}

impl From<Bytes> for ColumnValue {
  fn from(v: Bytes) -> Self {
    Self::Bytes(v)
  }
}

impl From<Vec<u8>> for ColumnValue {
  fn from(v: Vec<u8>) -> Self {
    Self::Bytes(v.into())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
  pub name: String,
  pub column_type: ColumnType,
  #[serde(default)]
  pub flags: ColumnFlags,
  pub value: ColumnValue,
}

impl Column {
  pub fn new(name: impl Into<String>, column_type: ColumnType, value: impl Into<ColumnValue>) -> Self {
    Self {
      name: name.into(),
      column_type,
      flags: ColumnFlags::empty(),
      value: value.into(),
    }
  }

  pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
    self.flags |= flags;
    self
  }

  /// Whether the value travels as raw bytes rather than text.
  pub fn is_binary(&self) -> bool {
    is_binary(self.column_type, self.flags)
  }

  pub fn is_handle_key(&self) -> bool {
    self.flags.contains(ColumnFlags::HANDLE_KEY)
  }
}

/// Blob family types are always binary; any other type is binary when flagged so.
pub fn is_binary(column_type: ColumnType, flags: ColumnFlags) -> bool {
  column_type.is_blob() || flags.contains(ColumnFlags::BINARY)
}
