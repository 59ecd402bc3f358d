//! Tagged wire form of a single column value.
//!
//! Every value on the wire names its kind (`null`, `int`, `uint`, `float`,
//! `string` or `binary`), so decoding never guesses from the payload. Binary
//! values are carried as base64 text and come back as bytes; text values come
//! back as text. The declared column type and binary flag travel next to the
//! value and are checked against the tag when decoding.

use bytes::Bytes;
use model::{is_binary, Column, ColumnFlags, ColumnType, ColumnValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireValue {
  Null,
  Int(i64),
  Uint(u64),
  Float(f64),
  String(String),
  Binary(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl WireValue {
  fn kind(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Int(_) => "int",
      Self::Uint(_) => "uint",
      Self::Float(_) => "float",
      Self::String(_) => "string",
      Self::Binary(_) => "binary",
    }
  }
}

/// A value whose kind contradicts the column's declared type or binary flag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{found} value does not fit column type {column_type} (binary: {binary})")]
pub struct TypeMismatch {
  pub column_type: ColumnType,
  pub binary: bool,
  pub found: &'static str,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
  #[error(transparent)]
  Mismatch(#[from] TypeMismatch),
  #[error("non-finite float {0}")]
  NonFinite(f64),
}

fn mismatch(column_type: ColumnType, binary: bool, found: &'static str) -> TypeMismatch {
  TypeMismatch {
    column_type,
    binary,
    found,
  }
}

/// Brings a captured value in line with its column's binary flag: binary
/// columns hold bytes, text columns hold valid UTF-8 text.
pub fn normalize_value(value: ColumnValue, column_type: ColumnType, binary: bool) -> Result<ColumnValue, TypeMismatch> {
  match value {
    ColumnValue::String(s) if binary => Ok(ColumnValue::Bytes(Bytes::from(s.into_bytes()))),
    ColumnValue::Bytes(b) if !binary => match String::from_utf8(b.to_vec()) {
      Ok(s) => Ok(ColumnValue::String(s)),
      Err(_) => Err(mismatch(column_type, binary, "non-utf8 bytes")),
    },
    value => Ok(value),
  }
}

pub fn encode_value(value: &ColumnValue, column_type: ColumnType, binary: bool) -> Result<WireValue, ValueError> {
  let wire = match value {
    ColumnValue::Null => WireValue::Null,
    ColumnValue::I64(_) | ColumnValue::U64(_) if binary || column_type.is_float() => {
      return Err(mismatch(column_type, binary, value.kind()).into());
    }
    ColumnValue::I64(v) => WireValue::Int(*v),
    ColumnValue::U64(v) => WireValue::Uint(*v),
    ColumnValue::F64(_) if binary || column_type.is_integer() => {
      return Err(mismatch(column_type, binary, value.kind()).into());
    }
    ColumnValue::F64(v) if !v.is_finite() => return Err(ValueError::NonFinite(*v)),
    ColumnValue::F64(v) => WireValue::Float(*v),
    ColumnValue::String(s) if binary => WireValue::Binary(s.as_bytes().to_vec()),
    ColumnValue::String(s) => WireValue::String(s.clone()),
    ColumnValue::Bytes(b) if binary => WireValue::Binary(b.to_vec()),
    ColumnValue::Bytes(b) => match std::str::from_utf8(b) {
      Ok(s) => WireValue::String(s.to_string()),
      Err(_) => return Err(mismatch(column_type, binary, "non-utf8 bytes").into()),
    },
  };
  Ok(wire)
}

/// `None` stands for a value that arrived without a tag.
pub fn decode_value(
  wire: Option<WireValue>,
  column_type: ColumnType,
  binary: bool,
) -> Result<ColumnValue, TypeMismatch> {
  let wire = wire.ok_or_else(|| mismatch(column_type, binary, "untagged"))?;
  let value = match wire {
    WireValue::Null => ColumnValue::Null,
    WireValue::Binary(b) if binary => ColumnValue::Bytes(Bytes::from(b)),
    WireValue::String(s) if !binary => ColumnValue::String(s),
    WireValue::Int(v) if !binary && !column_type.is_float() => ColumnValue::I64(v),
    WireValue::Uint(v) if !binary && !column_type.is_float() => ColumnValue::U64(v),
    WireValue::Float(v) if !binary && !column_type.is_integer() => ColumnValue::F64(v),
    other => return Err(mismatch(column_type, binary, other.kind())),
  };
  Ok(value)
}

/// A column inside a row message. The column name is the key of the
/// enclosing map.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageColumn {
  pub column_type: ColumnType,
  pub flags: ColumnFlags,
  pub value: ColumnValue,
}

impl MessageColumn {
  pub fn new(column_type: ColumnType, flags: ColumnFlags, value: impl Into<ColumnValue>) -> Self {
    Self {
      column_type,
      flags,
      value: value.into(),
    }
  }

  pub fn from_column(column: &Column) -> Result<Self, TypeMismatch> {
    let value = normalize_value(column.value.clone(), column.column_type, column.is_binary())?;
    Ok(Self {
      column_type: column.column_type,
      flags: column.flags,
      value,
    })
  }

  pub fn to_column(&self, name: impl Into<String>) -> Column {
    Column {
      name: name.into(),
      column_type: self.column_type,
      flags: self.flags,
      value: self.value.clone(),
    }
  }

  pub fn is_binary(&self) -> bool {
    is_binary(self.column_type, self.flags)
  }

  pub fn is_handle_key(&self) -> bool {
    self.flags.contains(ColumnFlags::HANDLE_KEY)
  }

  pub(crate) fn encode(&self) -> Result<WireColumn, ValueError> {
    let value = encode_value(&self.value, self.column_type, self.is_binary())?;
    Ok(WireColumn {
      column_type: self.column_type.code(),
      where_handle: self.is_handle_key().then_some(true),
      flags: self.flags.bits(),
      value: Some(value),
    })
  }

  pub(crate) fn decode(wire: WireColumn) -> Result<Self, TypeMismatch> {
    let column_type = ColumnType::from(wire.column_type);
    let mut flags = ColumnFlags::from_bits_retain(wire.flags);
    if wire.where_handle == Some(true) {
      flags |= ColumnFlags::HANDLE_KEY;
    }
    let value = decode_value(wire.value, column_type, is_binary(column_type, flags))?;
    Ok(Self {
      column_type,
      flags,
      value,
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireColumn {
  #[serde(rename = "t")]
  column_type: u8,
  #[serde(rename = "h", default, skip_serializing_if = "Option::is_none")]
  where_handle: Option<bool>,
  #[serde(rename = "f", default)]
  flags: u64,
  #[serde(rename = "v", default)]
  value: Option<WireValue>,
}

mod base64_bytes {
  use serde::{de, Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::encode(bytes))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    base64::decode(encoded).map_err(de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn round_trip(column: &MessageColumn) -> MessageColumn {
    let wire = column.encode().unwrap();
    let json = serde_json::to_string(&wire).unwrap();
    MessageColumn::decode(serde_json::from_str(&json).unwrap()).unwrap()
  }

  #[test]
  fn test_text_round_trips_as_text() {
    let column = MessageColumn::new(ColumnType::STRING, ColumnFlags::empty(), "测");
    assert_eq!(round_trip(&column), column);
  }

  #[test]
  fn test_binary_round_trips_as_bytes() {
    let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    let column = MessageColumn::new(ColumnType::STRING, ColumnFlags::BINARY, png.clone());
    let decoded = round_trip(&column);
    assert_eq!(decoded.value, ColumnValue::Bytes(png.into()));
    assert_eq!(decoded, column);
  }

  #[test]
  fn test_blob_round_trips_as_bytes() {
    let column = MessageColumn::new(ColumnType::BLOB, ColumnFlags::empty(), "测".as_bytes().to_vec());
    assert_eq!(round_trip(&column), column);
  }

  #[test]
  fn test_numbers_keep_their_class() {
    let columns = [
      MessageColumn::new(ColumnType::LONGLONG, ColumnFlags::empty(), i64::MIN),
      MessageColumn::new(ColumnType::LONGLONG, ColumnFlags::UNSIGNED, u64::MAX),
      MessageColumn::new(ColumnType::DOUBLE, ColumnFlags::empty(), 0.1f64),
      MessageColumn::new(ColumnType::DOUBLE, ColumnFlags::empty(), 2.0f64),
      MessageColumn::new(ColumnType::NEW_DECIMAL, ColumnFlags::empty(), "3.1400"),
      MessageColumn::new(ColumnType::DATETIME, ColumnFlags::NULLABLE, ColumnValue::Null),
    ];
    for column in columns {
      assert_eq!(round_trip(&column), column);
    }
  }

  #[test]
  fn test_handle_key_is_written_as_where_handle() {
    let column = MessageColumn::new(ColumnType::LONG, ColumnFlags::HANDLE_KEY, 1i64);
    let json = serde_json::to_value(column.encode().unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({"t": 3, "h": true, "f": 2, "v": {"int": 1}}));
  }

  #[test]
  fn test_where_handle_sets_handle_key_flag() {
    let wire: WireColumn = serde_json::from_str(r#"{"t":3,"h":true,"f":0,"v":{"int":1}}"#).unwrap();
    let column = MessageColumn::decode(wire).unwrap();
    assert!(column.is_handle_key());
  }

  #[test]
  fn test_decode_rejects_tag_contradicting_binary_flag() {
    let err = decode_value(Some(WireValue::String("x".into())), ColumnType::BLOB, true).unwrap_err();
    assert_eq!(err.found, "string");

    let err = decode_value(Some(WireValue::Binary(b"x".to_vec())), ColumnType::VARCHAR, false).unwrap_err();
    assert_eq!(err.found, "binary");
  }

  #[test]
  fn test_decode_rejects_missing_tag() {
    let err = decode_value(None, ColumnType::VARCHAR, false).unwrap_err();
    assert_eq!(err.found, "untagged");

    let wire: WireColumn = serde_json::from_str(r#"{"t":15,"f":0}"#).unwrap();
    assert!(MessageColumn::decode(wire).is_err());
  }

  #[test]
  fn test_decode_rejects_numeric_class_change() {
    assert!(decode_value(Some(WireValue::Float(1.5)), ColumnType::LONGLONG, false).is_err());
    assert!(decode_value(Some(WireValue::Int(1)), ColumnType::DOUBLE, false).is_err());
    assert_eq!(
      decode_value(Some(WireValue::Int(1)), ColumnType(0x42), false).unwrap(),
      ColumnValue::I64(1)
    );
  }

  #[test]
  fn test_encode_rejects_non_finite_float() {
    let err = encode_value(&ColumnValue::F64(f64::NAN), ColumnType::DOUBLE, false).unwrap_err();
    assert!(matches!(err, ValueError::NonFinite(_)));
  }

  #[test]
  fn test_encode_text_column_requires_utf8() {
    let err = encode_value(&ColumnValue::Bytes(vec![0xff].into()), ColumnType::VARCHAR, false).unwrap_err();
    assert!(matches!(err, ValueError::Mismatch(_)));

    let wire = encode_value(&ColumnValue::Bytes("value".into()), ColumnType::VARCHAR, false).unwrap();
    assert_eq!(wire, WireValue::String("value".to_string()));
  }

  #[test]
  fn test_normalize_follows_binary_flag() {
    let value = normalize_value("测".into(), ColumnType::STRING, true).unwrap();
    assert_eq!(value, ColumnValue::Bytes("测".as_bytes().to_vec().into()));

    let value = normalize_value(b"value".to_vec().into(), ColumnType::STRING, false).unwrap();
    assert_eq!(value, ColumnValue::String("value".to_string()));
  }
}
