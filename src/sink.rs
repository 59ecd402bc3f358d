use model::RowChangedEvent;
use serde::{Deserialize, Serialize};

use crate::{
  open::{EncodedMessage, RowEventDecoder, RowEventEncoder},
  Error, Result,
};

pub mod stdout;

/// A message written as one line of text, key and value in base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedLine {
  pub key: String,
  pub value: String,
}

impl From<&EncodedMessage> for EncodedLine {
  fn from(message: &EncodedMessage) -> Self {
    Self {
      key: base64::encode(&message.key),
      value: base64::encode(&message.value),
    }
  }
}

impl EncodedLine {
  pub fn decode(&self) -> Result<EncodedMessage> {
    let key = base64::decode(&self.key).map_err(|err| Error::malformed("message key", err))?;
    let value = base64::decode(&self.value).map_err(|err| Error::malformed("message value", err))?;
    Ok(EncodedMessage { key, value })
  }
}

/// What a sink does with each input line.
#[derive(Debug, Clone)]
pub enum Mode {
  /// JSON change event in, encoded message line out.
  Encode(RowEventEncoder),
  /// Encoded message line in, JSON change event out.
  Decode,
}

impl Mode {
  pub fn process(&self, line: &str) -> Result<String> {
    match self {
      Self::Encode(encoder) => {
        let event: RowChangedEvent =
          serde_json::from_str(line).map_err(|err| Error::malformed("change event", err))?;
        let message = encoder.encode(&event)?;
        serde_json::to_string(&EncodedLine::from(&message)).map_err(Error::Encode)
      }
      Self::Decode => {
        let line: EncodedLine = serde_json::from_str(line).map_err(|err| Error::malformed("encoded line", err))?;
        let message = line.decode()?;
        let event = RowEventDecoder::new().decode(&message.key, &message.value)?;
        serde_json::to_string(&event).map_err(Error::Encode)
      }
    }
  }
}
