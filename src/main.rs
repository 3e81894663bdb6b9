mod config;
mod error;
mod interrupt;
mod playback;
mod relay;
mod source;

use crate::config::RelayConfig;
use crate::interrupt::Interrupt;
use crate::playback::{PlayerCommand, ProcessSink};
use crate::relay::{Relay, RelayOutcome};
use crate::source::SourceConnection;
use clap::Parser;
use std::net::Shutdown;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Play a raw PCM stream from a TCP server through paplay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "pcm_relay=warn",
        1 => "pcm_relay=info",
        2 => "pcm_relay=debug",
        _ => "pcm_relay=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = RelayConfig::default();
    let interrupt = Interrupt::new();
    interrupt.install_ctrlc()?;

    let relay = Relay::start(
        &config,
        |config| {
            let source = SourceConnection::connect(&config.host, config.port)?;
            match source.shutdown_handle() {
                Ok(handle) => interrupt.on_trigger(move || {
                    let _ = handle.shutdown(Shutdown::Both);
                }),
                Err(e) => warn!("interrupt cannot wake a blocked read: {e}"),
            }
            Ok(source)
        },
        |config| {
            let command = PlayerCommand::paplay(config.player.as_str(), &config.format);
            let sink = ProcessSink::spawn(&command, config.drain_timeout)?;
            // the player has its own process group, so only this stops it
            let player = sink.handle();
            interrupt.on_trigger(move || player.terminate());
            Ok(sink)
        },
    )?;

    info!(
        endpoint = %config.endpoint(),
        bytes_per_second = config.format.bytes_per_second(),
        "relay streaming"
    );
    println!("[*] streaming {} … Ctrl-C to stop", config.format);

    match relay.run(&interrupt)? {
        RelayOutcome::EndOfStream(stats) => {
            info!(chunks = stats.chunks, bytes = stats.bytes, "source closed the stream");
        }
        RelayOutcome::Interrupted(stats) => {
            println!("\n[*] shutting down");
            info!(chunks = stats.chunks, bytes = stats.bytes, "relay interrupted");
        }
    }

    Ok(())
}
