use std::collections::BTreeMap;

use url::Url;

use crate::Error;

pub const PROTOCOL: &str = "open-protocol";

/// 10MB, the default message size limit of most brokers.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Emit only handle key columns in delete messages.
  pub only_handle_key_columns: bool,
  /// Upper bound of key plus value length of one message.
  pub max_message_bytes: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      only_handle_key_columns: false,
      max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
    }
  }
}

/// Reads the codec options from a sink URI, e.g.
/// `kafka://127.0.0.1:9092/topic?protocol=open-protocol&only-handle-key-columns=true`.
impl TryFrom<&Url> for Config {
  type Error = Error;

  fn try_from(url: &Url) -> Result<Self, Self::Error> {
    let query_pairs = url.query_pairs().collect::<BTreeMap<_, _>>();

    if let Some(protocol) = query_pairs.get("protocol") {
      if protocol != PROTOCOL {
        return Err(Error::Config(format!("protocol {} is not supported", protocol)));
      }
    }

    let only_handle_key_columns = match query_pairs.get("only-handle-key-columns") {
      Some(v) => v
        .parse::<bool>()
        .map_err(|_| Error::Config(format!("invalid only-handle-key-columns {}", v)))?,
      None => false,
    };

    let max_message_bytes = match query_pairs.get("max-message-bytes") {
      Some(v) => match v.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => return Err(Error::Config(format!("invalid max-message-bytes {}", v))),
      },
      None => DEFAULT_MAX_MESSAGE_BYTES,
    };

    Ok(Self {
      only_handle_key_columns,
      max_message_bytes,
    })
  }
}
