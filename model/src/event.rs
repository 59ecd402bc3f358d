use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::column::Column;

/// Number of logical bits in a TSO commit timestamp.
const TSO_LOGICAL_BITS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableName {
  pub schema: String,
  pub table: String,
  /// Physical table id, only meaningful when `is_partition` is set.
  #[serde(default)]
  pub table_id: i64,
  #[serde(default)]
  pub is_partition: bool,
}

impl TableName {
  pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
    Self {
      schema: schema.into(),
      table: table.into(),
      ..Default::default()
    }
  }

  pub fn partition(mut self, table_id: i64) -> Self {
    self.table_id = table_id;
    self.is_partition = true;
    self
  }
}

impl fmt::Display for TableName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.schema, self.table)
  }
}

/// One committed row change captured upstream.
///
/// `columns` is the after image and `pre_columns` the before image; an empty
/// list means the image is absent. Inserts only carry `columns`, deletes only
/// `pre_columns`, updates carry both.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowChangedEvent {
  pub commit_ts: u64,
  #[serde(default)]
  pub row_id: i64,
  pub table: TableName,
  #[serde(default)]
  pub columns: Vec<Column>,
  #[serde(default)]
  pub pre_columns: Vec<Column>,
}

impl RowChangedEvent {
  pub fn is_insert(&self) -> bool {
    !self.columns.is_empty() && self.pre_columns.is_empty()
  }

  pub fn is_update(&self) -> bool {
    !self.columns.is_empty() && !self.pre_columns.is_empty()
  }

  pub fn is_delete(&self) -> bool {
    self.columns.is_empty() && !self.pre_columns.is_empty()
  }

  /// Wall-clock time of the commit, from the physical part of `commit_ts`.
  pub fn commit_time(&self) -> Option<DateTime<Utc>> {
    commit_time(self.commit_ts)
  }
}

/// Physical milliseconds are stored above the logical counter bits.
pub fn commit_time(commit_ts: u64) -> Option<DateTime<Utc>> {
  let millis = i64::try_from(commit_ts >> TSO_LOGICAL_BITS).ok()?;
  Utc.timestamp_millis_opt(millis).single()
}
