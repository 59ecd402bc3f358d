//! Open protocol: a row change travels as a JSON key naming its table and
//! commit timestamp, plus a JSON value holding the after image, the before
//! image or the delete key set of the row.

mod adapter;
mod codec;
pub mod column;
mod config;
mod key;
mod message;

pub use adapter::{msg_to_row_change, row_change_to_msg};
pub use codec::{decode, EncodedMessage, RowEventDecoder, RowEventEncoder};
pub use column::{MessageColumn, TypeMismatch, WireValue};
pub use config::{Config, DEFAULT_MAX_MESSAGE_BYTES, PROTOCOL};
pub use key::{MessageKey, MessageType};
pub use message::{ColumnMap, RowMessage};
