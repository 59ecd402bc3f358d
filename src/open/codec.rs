use model::RowChangedEvent;

use super::{
  adapter::{msg_to_row_change, row_change_to_msg},
  config::Config,
  key::MessageKey,
  message::RowMessage,
};
use crate::{Error, Result};

/// Key and value bytes of one message, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
  pub key: Vec<u8>,
  pub value: Vec<u8>,
}

impl EncodedMessage {
  pub fn len(&self) -> usize {
    self.key.len() + self.value.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Turns row changes into messages. Holds only its configuration, so one
/// encoder can be cloned into any number of tasks.
#[derive(Debug, Clone, Default)]
pub struct RowEventEncoder {
  config: Config,
}

impl RowEventEncoder {
  pub fn new(config: Config) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn encode(&self, event: &RowChangedEvent) -> Result<EncodedMessage> {
    let (key, message) = row_change_to_msg(event, self.config.only_handle_key_columns)?;
    let encoded = EncodedMessage {
      key: key.encode()?,
      value: message.encode()?,
    };
    if encoded.len() > self.config.max_message_bytes {
      return Err(Error::MessageTooLarge {
        table: event.table.to_string(),
        size: encoded.len(),
        max: self.config.max_message_bytes,
      });
    }
    Ok(encoded)
  }
}

/// Inverse of [`RowEventEncoder::encode`]. Decoding needs nothing but the
/// message bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowEventDecoder;

impl RowEventDecoder {
  pub fn new() -> Self {
    Self
  }

  pub fn decode(&self, key: &[u8], value: &[u8]) -> Result<RowChangedEvent> {
    let key = MessageKey::decode(key)?;
    let message = RowMessage::decode(value)?;
    msg_to_row_change(&key, message)
  }
}

pub fn decode(key: &[u8], value: &[u8]) -> Result<RowChangedEvent> {
  RowEventDecoder.decode(key, value)
}
