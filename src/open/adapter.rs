use model::{Column, RowChangedEvent};
use tracing::debug;

use super::{
  column::MessageColumn,
  key::MessageKey,
  message::{ColumnMap, RowMessage},
};
use crate::{Error, Result};

/// Splits a row change into its routing key and row message.
///
/// Inserts and updates carry their after image, plus the before image for
/// updates. Deletes carry their before image as the delete key set, cut down
/// to the handle key columns when `only_handle_key_columns` is set. A delete
/// without any handle key column then yields an empty key set.
pub fn row_change_to_msg(event: &RowChangedEvent, only_handle_key_columns: bool) -> Result<(MessageKey, RowMessage)> {
  let key = MessageKey::row(&event.table, event.commit_ts, event.row_id);

  let message = if !event.columns.is_empty() {
    let new_values = to_column_map(event, &event.columns, false)?;
    if event.pre_columns.is_empty() {
      RowMessage::insert(new_values)
    } else {
      RowMessage::update(new_values, to_column_map(event, &event.pre_columns, false)?)
    }
  } else if !event.pre_columns.is_empty() {
    let delete_keys = to_column_map(event, &event.pre_columns, only_handle_key_columns)?;
    if delete_keys.len() < event.pre_columns.len() {
      debug!(
        table = %event.table,
        kept = delete_keys.len(),
        dropped = event.pre_columns.len() - delete_keys.len(),
        "kept only handle key columns of deleted row"
      );
    }
    RowMessage::delete(delete_keys)
  } else {
    return Err(Error::InvalidChangeEvent {
      table: event.table.to_string(),
    });
  };

  Ok((key, message))
}

/// Rebuilds the row change a message was made from. Columns come back
/// ordered by name.
pub fn msg_to_row_change(key: &MessageKey, message: RowMessage) -> Result<RowChangedEvent> {
  let table = key.table_name()?;
  message.check()?;

  let (columns, pre_columns) = match message.delete_keys {
    // an empty key set still marks a delete.
    Some(delete_keys) => (vec![], from_column_map(delete_keys)),
    None => {
      let columns = from_column_map(message.new_values.unwrap_or_default());
      if columns.is_empty() {
        return Err(Error::InvalidChangeEvent { table: table.to_string() });
      }
      (columns, from_column_map(message.old_values.unwrap_or_default()))
    }
  };

  Ok(RowChangedEvent {
    commit_ts: key.ts,
    row_id: key.row_id,
    table,
    columns,
    pre_columns,
  })
}

fn to_column_map(event: &RowChangedEvent, columns: &[Column], only_handle_key_columns: bool) -> Result<ColumnMap> {
  let mut map = ColumnMap::new();
  for column in columns {
    if only_handle_key_columns && !column.is_handle_key() {
      continue;
    }
    let value = MessageColumn::from_column(column).map_err(|source| Error::TypeMismatch {
      column: column.name.clone(),
      source,
    })?;
    if map.insert(column.name.clone(), value).is_some() {
      return Err(Error::DuplicateColumn {
        table: event.table.to_string(),
        column: column.name.clone(),
      });
    }
  }
  Ok(map)
}

fn from_column_map(columns: ColumnMap) -> Vec<Column> {
  columns.into_iter().map(|(name, column)| column.to_column(name)).collect()
}
