use std::fmt;

use chrono::{DateTime, Utc};
use model::TableName;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageType {
  Row = 1,
  Ddl = 2,
  Resolved = 3,
}

impl TryFrom<u8> for MessageType {
  type Error = String;

  fn try_from(v: u8) -> Result<Self, Self::Error> {
    match v {
      1 => Ok(Self::Row),
      2 => Ok(Self::Ddl),
      3 => Ok(Self::Resolved),
      v => Err(format!("unknown message type {}", v)),
    }
  }
}

impl From<MessageType> for u8 {
  fn from(v: MessageType) -> Self {
    v as u8
  }
}

impl fmt::Display for MessageType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Row => f.write_str("row"),
      Self::Ddl => f.write_str("ddl"),
      Self::Resolved => f.write_str("resolved"),
    }
  }
}

fn is_zero(v: &i64) -> bool {
  *v == 0
}

/// Routing half of a message: which table the row belongs to and when it
/// was committed. The transport partitions and orders on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageKey {
  pub ts: u64,
  #[serde(rename = "scm", default, skip_serializing_if = "Option::is_none")]
  pub schema: Option<String>,
  #[serde(rename = "tbl", default, skip_serializing_if = "Option::is_none")]
  pub table: Option<String>,
  #[serde(rename = "rid", default, skip_serializing_if = "is_zero")]
  pub row_id: i64,
  /// Physical table id of a partitioned table.
  #[serde(rename = "ptn", default, skip_serializing_if = "Option::is_none")]
  pub partition: Option<i64>,
  #[serde(rename = "t")]
  pub message_type: MessageType,
}

impl MessageKey {
  pub fn row(table: &TableName, ts: u64, row_id: i64) -> Self {
    Self {
      ts,
      schema: Some(table.schema.clone()),
      table: Some(table.table.clone()),
      row_id,
      partition: table.is_partition.then_some(table.table_id),
      message_type: MessageType::Row,
    }
  }

  /// Table identity of a row key.
  pub fn table_name(&self) -> Result<TableName> {
    if self.message_type != MessageType::Row {
      return Err(Error::MalformedPayload(format!(
        "expected a row message key, got a {} key",
        self.message_type
      )));
    }
    let (Some(schema), Some(table)) = (&self.schema, &self.table) else {
      return Err(Error::MalformedPayload("row message key without schema or table".to_string()));
    };
    let name = TableName::new(schema.as_str(), table.as_str());
    Ok(match self.partition {
      Some(table_id) => name.partition(table_id),
      None => name,
    })
  }

  pub fn commit_time(&self) -> Option<DateTime<Utc>> {
    model::commit_time(self.ts)
  }

  pub fn encode(&self) -> Result<Vec<u8>> {
    serde_json::to_vec(self).map_err(Error::Encode)
  }

  pub fn decode(payload: &[u8]) -> Result<Self> {
    serde_json::from_slice(payload).map_err(|err| Error::malformed("message key", err))
  }
}
