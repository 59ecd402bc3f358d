//! Row change events as produced by the capture layer and consumed by sinks.

mod column;
mod debug;
mod event;

pub use column::{is_binary, Column, ColumnFlags, ColumnType, ColumnValue};
pub use debug::DebugBytesRef;
pub use event::{commit_time, RowChangedEvent, TableName};
