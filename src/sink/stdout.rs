use tokio::{
  io::{AsyncWrite, AsyncWriteExt},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{info, warn};

use super::Mode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
  pub written: u64,
  pub dropped: u64,
}

/// Runs every received line through the codec and writes the result, one
/// line per message. A line the codec rejects is logged and dropped.
#[derive(Debug)]
pub struct RowMessageSink;

impl RowMessageSink {
  pub fn spawn(receiver: mpsc::Receiver<String>, mode: Mode) -> (Self, JoinHandle<SinkStats>) {
    Self::spawn_with_writer(receiver, mode, tokio::io::stdout())
  }

  pub fn spawn_with_writer<W>(
    mut receiver: mpsc::Receiver<String>,
    mode: Mode,
    mut writer: W,
  ) -> (Self, JoinHandle<SinkStats>)
  where
    W: AsyncWrite + Unpin + Send + 'static,
  {
    let handle = tokio::task::spawn(async move {
      let mut stats = SinkStats::default();
      while let Some(line) = receiver.recv().await {
        let mut output = match mode.process(&line) {
          Ok(output) => output,
          Err(err) => {
            warn!(error = %err, "dropped input line");
            stats.dropped += 1;
            continue;
          }
        };
        output.push('\n');
        if let Err(err) = writer.write_all(output.as_bytes()).await {
          warn!(error = %err, "failed to write output line");
          break;
        }
        stats.written += 1;
      }

      if let Err(err) = writer.flush().await {
        warn!(error = %err, "failed to flush output");
      }
      info!(written = stats.written, dropped = stats.dropped, "sink closed");
      stats
    });
    (Self, handle)
  }
}

#[cfg(test)]
mod tests {
  use model::{Column, ColumnType, RowChangedEvent, TableName};
  use tokio::io::AsyncReadExt;

  use super::*;
  use crate::open::RowEventEncoder;

  #[tokio::test]
  async fn test_drops_bad_lines_and_keeps_going() {
    let event = RowChangedEvent {
      commit_ts: 1,
      row_id: 0,
      table: TableName::new("schema", "table"),
      columns: vec![Column::new("id", ColumnType::LONG, 1i64)],
      pre_columns: vec![],
    };
    let invalid = RowChangedEvent {
      columns: vec![],
      ..event.clone()
    };

    let (sender, receiver) = mpsc::channel(8);
    let (writer, mut reader) = tokio::io::duplex(4096);
    let (_sink, handle) =
      RowMessageSink::spawn_with_writer(receiver, Mode::Encode(RowEventEncoder::default()), writer);

    sender.send(serde_json::to_string(&event).unwrap()).await.unwrap();
    sender.send("not an event".to_string()).await.unwrap();
    sender.send(serde_json::to_string(&invalid).unwrap()).await.unwrap();
    sender.send(serde_json::to_string(&event).unwrap()).await.unwrap();
    drop(sender);

    let stats = handle.await.unwrap();
    assert_eq!(stats, SinkStats { written: 2, dropped: 2 });

    let mut output = String::new();
    reader.read_to_string(&mut output).await.unwrap();
    assert_eq!(output.lines().count(), 2);
    for line in output.lines() {
      assert_eq!(
        Mode::Decode.process(line).map(|decoded| serde_json::from_str::<RowChangedEvent>(&decoded).unwrap()).unwrap(),
        event
      );
    }
  }
}
