use std::io;

use thiserror::Error;

use crate::open::column::{TypeMismatch, ValueError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of a single row. None of them are retried here: callers log the
/// context carried by the error and drop (or dead-letter) the row.
#[derive(Debug, Error)]
pub enum Error {
  #[error("column `{column}`: {source}")]
  TypeMismatch {
    column: String,
    #[source]
    source: TypeMismatch,
  },

  #[error("column `{column}`: float {value} has no wire representation")]
  UnrepresentableValue { column: String, value: f64 },

  #[error("malformed payload: {0}")]
  MalformedPayload(String),

  #[error("invalid change event for table {table}: neither columns nor pre-columns are set")]
  InvalidChangeEvent { table: String },

  #[error("duplicate column `{column}` in a row of table {table}")]
  DuplicateColumn { table: String, column: String },

  #[error("message for table {table} is {size} bytes, larger than max-message-bytes {max}")]
  MessageTooLarge { table: String, size: usize, max: usize },

  #[error("failed to encode message: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("invalid configuration: {0}")]
  Config(String),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

impl Error {
  pub(crate) fn value(column: impl Into<String>, err: ValueError) -> Self {
    let column = column.into();
    match err {
      ValueError::Mismatch(source) => Self::TypeMismatch { column, source },
      ValueError::NonFinite(value) => Self::UnrepresentableValue { column, value },
    }
  }

  pub(crate) fn malformed(what: &str, err: impl std::fmt::Display) -> Self {
    Self::MalformedPayload(format!("{}: {}", what, err))
  }
}
