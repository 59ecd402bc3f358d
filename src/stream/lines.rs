use tokio::{
  io::{AsyncBufReadExt, AsyncRead, BufReader},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{info, warn};

/// Feeds the non-blank lines of a reader into the pipeline until the reader
/// is exhausted, the receiving side goes away or the process is interrupted.
#[derive(Debug)]
pub struct LineStream;

impl LineStream {
  pub fn spawn<R>(reader: R, sender: mpsc::Sender<String>) -> (Self, JoinHandle<()>)
  where
    R: AsyncRead + Unpin + Send + 'static,
  {
    let handle = tokio::task::spawn(async move {
      let mut reader = BufReader::new(reader);
      let mut buf = Vec::new();

      let interrupt = tokio::signal::ctrl_c();
      tokio::pin!(interrupt);

      let mut count = 0u64;
      let mut line_number = 0u64;
      loop {
        buf.clear();
        tokio::select! {
          Ok(_) = &mut interrupt => break,
          read = reader.read_until(b'\n', &mut buf) => {
            match read {
              Ok(0) => break,
              Ok(_) => {}
              Err(err) => {
                warn!(error = %err, "failed to read input");
                break;
              }
            }
          },
        }

        line_number += 1;
        let line = match String::from_utf8(std::mem::take(&mut buf)) {
          Ok(line) => line,
          Err(err) => {
            warn!(line = line_number, error = %err, "dropping line that is not valid UTF-8");
            continue;
          }
        };
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
          continue;
        }
        if sender.send(line.to_string()).await.is_err() {
          break;
        }
        count += 1;
      }

      info!(lines = count, "input stream closed");
    });
    (Self, handle)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_skips_blank_lines() {
    let (sender, mut receiver) = mpsc::channel(8);
    let (_stream, handle) = LineStream::spawn(&b"first\n\n  \nsecond\n"[..], sender);
    handle.await.unwrap();

    assert_eq!(receiver.recv().await.as_deref(), Some("first"));
    assert_eq!(receiver.recv().await.as_deref(), Some("second"));
    assert_eq!(receiver.recv().await, None);
  }

  #[tokio::test]
  async fn test_invalid_utf8_line_is_dropped() {
    let (sender, mut receiver) = mpsc::channel(8);
    let (_stream, handle) = LineStream::spawn(&b"first\n\xff\nsecond\r\nlast"[..], sender);
    handle.await.unwrap();

    assert_eq!(receiver.recv().await.as_deref(), Some("first"));
    assert_eq!(receiver.recv().await.as_deref(), Some("second"));
    assert_eq!(receiver.recv().await.as_deref(), Some("last"));
    assert_eq!(receiver.recv().await, None);
  }
}
