use std::io;

use clap::{value_parser, Arg, ArgAction, Command};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use opencodec::{
  open::{Config, RowEventEncoder},
  sink::{stdout::RowMessageSink, Mode},
  stream::lines::LineStream,
  Result,
};

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let mut matches = cli().get_matches_mut();

  let mut config = match matches.remove_one::<Url>("sink-uri") {
    Some(url) => Config::try_from(&url)?,
    None => Config::default(),
  };
  let capacity = matches.remove_one::<u64>("channel-capacity").unwrap_or(32) as usize;

  let mode = match matches.remove_subcommand() {
    Some((name, mut sub_matches)) if name == "encode" => {
      if sub_matches.get_flag("only-handle-key-columns") {
        config.only_handle_key_columns = true;
      }
      if let Some(max_message_bytes) = sub_matches.remove_one::<u64>("max-message-bytes") {
        config.max_message_bytes = max_message_bytes as usize;
      }
      info!(?config, "encoding row change events");
      Mode::Encode(RowEventEncoder::new(config))
    }
    _ => {
      info!("decoding messages");
      Mode::Decode
    }
  };

  let (sender, receiver) = mpsc::channel(capacity);
  let (_line_stream, line_stream_handle) = LineStream::spawn(tokio::io::stdin(), sender);
  let (_sink, sink_handle) = RowMessageSink::spawn(receiver, mode);

  let (_, stats) = tokio::try_join!(line_stream_handle, sink_handle).map_err(io::Error::from)?;
  info!(written = stats.written, dropped = stats.dropped, "done");

  Ok(())
}

fn cli() -> Command {
  Command::new("opencodec")
    .version("1.0")
    .about("Encodes row change events into open protocol messages and back")
    .subcommand_required(true)
    .arg(
      Arg::new("sink-uri")
        .long("sink-uri")
        .help("sink URI carrying codec options in its query string")
        .value_parser(Url::parse),
    )
    .arg(
      Arg::new("channel-capacity")
        .long("channel-capacity")
        .default_value("32")
        .value_parser(value_parser!(u64).range(1..)),
    )
    .subcommand(
      Command::new("encode")
        .about("reads JSON change events from stdin, writes encoded messages")
        .arg(
          Arg::new("only-handle-key-columns")
            .long("only-handle-key-columns")
            .action(ArgAction::SetTrue),
        )
        .arg(
          Arg::new("max-message-bytes")
            .long("max-message-bytes")
            .value_parser(value_parser!(u64).range(1..)),
        ),
    )
    .subcommand(Command::new("decode").about("reads encoded messages from stdin, writes JSON change events"))
}
