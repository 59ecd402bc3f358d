use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::column::{MessageColumn, WireColumn};
use crate::{Error, Result};

pub type ColumnMap = BTreeMap<String, MessageColumn>;

/// The value half of a row message.
///
/// Each mapping is optional, and an absent mapping is kept apart from an
/// empty one through encode and decode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowMessage {
  /// After image of an insert or update.
  pub new_values: Option<ColumnMap>,
  /// Before image of an update.
  pub old_values: Option<ColumnMap>,
  /// Key columns (or all columns) of a deleted row.
  pub delete_keys: Option<ColumnMap>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireRow {
  #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
  update: Option<BTreeMap<String, WireColumn>>,
  #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
  pre_columns: Option<BTreeMap<String, WireColumn>>,
  #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
  delete: Option<BTreeMap<String, WireColumn>>,
}

impl RowMessage {
  pub fn insert(new_values: ColumnMap) -> Self {
    Self {
      new_values: Some(new_values),
      ..Default::default()
    }
  }

  pub fn update(new_values: ColumnMap, old_values: ColumnMap) -> Self {
    Self {
      new_values: Some(new_values),
      old_values: Some(old_values),
      delete_keys: None,
    }
  }

  pub fn delete(delete_keys: ColumnMap) -> Self {
    Self {
      delete_keys: Some(delete_keys),
      ..Default::default()
    }
  }

  pub fn is_delete(&self) -> bool {
    self.delete_keys.is_some()
  }

  /// A message carries either a new image or a delete key set, and an old
  /// image only next to a new one.
  pub fn check(&self) -> Result<()> {
    let non_empty = |map: &Option<ColumnMap>| map.as_ref().map_or(false, |m| !m.is_empty());
    if non_empty(&self.new_values) && non_empty(&self.delete_keys) {
      return Err(Error::malformed("row message", "both new values and delete keys are set"));
    }
    if non_empty(&self.old_values) && !non_empty(&self.new_values) {
      return Err(Error::malformed("row message", "old values are set without new values"));
    }
    Ok(())
  }

  pub fn encode(&self) -> Result<Vec<u8>> {
    self.check()?;
    let row = WireRow {
      update: encode_map(self.new_values.as_ref())?,
      pre_columns: encode_map(self.old_values.as_ref())?,
      delete: encode_map(self.delete_keys.as_ref())?,
    };
    serde_json::to_vec(&row).map_err(Error::Encode)
  }

  pub fn decode(payload: &[u8]) -> Result<Self> {
    let row: WireRow = serde_json::from_slice(payload).map_err(|err| Error::malformed("row message", err))?;
    let message = Self {
      new_values: decode_map(row.update)?,
      old_values: decode_map(row.pre_columns)?,
      delete_keys: decode_map(row.delete)?,
    };
    message.check()?;
    Ok(message)
  }
}

fn encode_map(map: Option<&ColumnMap>) -> Result<Option<BTreeMap<String, WireColumn>>> {
  let Some(map) = map else {
    return Ok(None);
  };
  map
    .iter()
    .map(|(name, column)| {
      let wire = column.encode().map_err(|err| Error::value(name, err))?;
      Ok((name.clone(), wire))
    })
    .collect::<Result<_>>()
    .map(Some)
}

fn decode_map(map: Option<BTreeMap<String, WireColumn>>) -> Result<Option<ColumnMap>> {
  let Some(map) = map else {
    return Ok(None);
  };
  map
    .into_iter()
    .map(|(name, wire)| match MessageColumn::decode(wire) {
      Ok(column) => Ok((name, column)),
      Err(source) => Err(Error::TypeMismatch { column: name, source }),
    })
    .collect::<Result<_>>()
    .map(Some)
}

#[cfg(test)]
mod tests {
  use model::{ColumnFlags, ColumnType, ColumnValue};

  use super::*;

  fn column(column_type: ColumnType, value: impl Into<ColumnValue>) -> MessageColumn {
    MessageColumn::new(column_type, ColumnFlags::empty(), value)
  }

  #[test]
  fn test_format_col() {
    let row = RowMessage::insert(ColumnMap::from([("test".to_string(), column(ColumnType::STRING, "测"))]));
    assert_eq!(RowMessage::decode(&row.encode().unwrap()).unwrap(), row);

    let row = RowMessage::insert(ColumnMap::from([(
      "test".to_string(),
      column(ColumnType::BLOB, "测".as_bytes().to_vec()),
    )]));
    assert_eq!(RowMessage::decode(&row.encode().unwrap()).unwrap(), row);
  }

  #[test]
  fn test_update_round_trip() {
    let new_values = ColumnMap::from([
      (
        "id".to_string(),
        MessageColumn::new(ColumnType::LONGLONG, ColumnFlags::HANDLE_KEY, 1i64),
      ),
      ("a".to_string(), column(ColumnType::DOUBLE, 2.5f64)),
      ("b".to_string(), column(ColumnType::VARCHAR, ColumnValue::Null)),
    ]);
    let old_values = ColumnMap::from([
      (
        "id".to_string(),
        MessageColumn::new(ColumnType::LONGLONG, ColumnFlags::HANDLE_KEY, 1i64),
      ),
      ("a".to_string(), column(ColumnType::DOUBLE, 1.25f64)),
    ]);
    let row = RowMessage::update(new_values, old_values);
    assert_eq!(RowMessage::decode(&row.encode().unwrap()).unwrap(), row);
  }

  #[test]
  fn test_absent_and_empty_maps_stay_apart() {
    let row = RowMessage::delete(ColumnMap::new());
    let payload = row.encode().unwrap();
    assert_eq!(payload, br#"{"d":{}}"#);

    let decoded = RowMessage::decode(&payload).unwrap();
    assert_eq!(decoded.delete_keys, Some(ColumnMap::new()));
    assert_eq!(decoded.new_values, None);
    assert_eq!(decoded.old_values, None);
  }

  #[test]
  fn test_decode_malformed_payload() {
    let payloads: [&[u8]; 4] = [
      b"not json",
      br#"{"u":[1]}"#,
      br#"{"u":{"a":{"t":"x"}}}"#,
      br#"{"u":{"a":{"t":3,"v":{"decimal":1}}}}"#,
    ];
    for payload in payloads {
      assert!(
        matches!(RowMessage::decode(payload), Err(Error::MalformedPayload(_))),
        "{:?}",
        String::from_utf8_lossy(payload)
      );
    }
  }

  #[test]
  fn test_decode_rejects_inconsistent_images() {
    let payload = br#"{"u":{"a":{"t":3,"v":{"int":1}}},"d":{"a":{"t":3,"v":{"int":1}}}}"#;
    assert!(matches!(RowMessage::decode(payload), Err(Error::MalformedPayload(_))));

    let payload = br#"{"p":{"a":{"t":3,"v":{"int":1}}}}"#;
    assert!(matches!(RowMessage::decode(payload), Err(Error::MalformedPayload(_))));
  }

  #[test]
  fn test_encode_rejects_inconsistent_images() {
    let id = || ColumnMap::from([("id".to_string(), column(ColumnType::LONGLONG, 1i64))]);

    let row = RowMessage {
      new_values: Some(id()),
      old_values: None,
      delete_keys: Some(id()),
    };
    assert!(matches!(row.encode(), Err(Error::MalformedPayload(_))));

    let row = RowMessage {
      new_values: None,
      old_values: Some(id()),
      delete_keys: None,
    };
    assert!(matches!(row.encode(), Err(Error::MalformedPayload(_))));

    // an empty delete key set next to a new image is still a valid insert
    let row = RowMessage {
      new_values: Some(id()),
      old_values: None,
      delete_keys: Some(ColumnMap::new()),
    };
    assert_eq!(RowMessage::decode(&row.encode().unwrap()).unwrap(), row);
  }

  #[test]
  fn test_decode_type_mismatch_names_column() {
    let payload = br#"{"u":{"photo":{"t":252,"f":0,"v":{"string":"abc"}}}}"#;
    match RowMessage::decode(payload) {
      Err(Error::TypeMismatch { column, source }) => {
        assert_eq!(column, "photo");
        assert_eq!(source.found, "string");
        assert!(source.binary);
      }
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn test_encode_unrepresentable_float() {
    let row = RowMessage::insert(ColumnMap::from([("f".to_string(), column(ColumnType::DOUBLE, f64::INFINITY))]));
    assert!(matches!(
      row.encode(),
      Err(Error::UnrepresentableValue { column, .. }) if column == "f"
    ));
  }
}
