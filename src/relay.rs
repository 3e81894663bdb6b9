use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::interrupt::Interrupt;
use crate::playback::PlaybackSink;
use crate::source::AudioSource;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Connected,
    Streaming,
    ShuttingDown,
    Closed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub chunks: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The server closed the connection.
    EndOfStream(RelayStats),
    Interrupted(RelayStats),
}

/// Owns both ends of the relay. Either both are open or the relay is torn down.
pub struct Relay<S: AudioSource, P: PlaybackSink> {
    source: S,
    sink: P,
    chunk_size: usize,
    state: RelayState,
}

impl<S: AudioSource, P: PlaybackSink> Relay<S, P> {
    /// Opens the source, then the sink. The sink is never launched when the
    /// source fails, and a sink failure closes the source before returning.
    pub fn start<C, L>(config: &RelayConfig, connect: C, launch: L) -> Result<Self, RelayError>
    where
        C: FnOnce(&RelayConfig) -> Result<S, RelayError>,
        L: FnOnce(&RelayConfig) -> Result<P, RelayError>,
    {
        config.validate()?;

        let mut state = RelayState::Idle;
        let mut source = connect(config)?;
        transition(&mut state, RelayState::Connected);

        let sink = match launch(config) {
            Ok(sink) => sink,
            Err(e) => {
                source.close();
                return Err(e);
            }
        };
        transition(&mut state, RelayState::Streaming);

        Ok(Self {
            source,
            sink,
            chunk_size: config.chunk_size,
            state,
        })
    }

    /// Forwards chunks until end of stream, interrupt or a fatal error, then
    /// closes the source and the sink.
    pub fn run(mut self, interrupt: &Interrupt) -> Result<RelayOutcome, RelayError> {
        let result = self.pump(interrupt);
        if let Err(e) = &result {
            debug!("relay stopped: {e}");
        }
        self.teardown();
        result
    }

    fn pump(&mut self, interrupt: &Interrupt) -> Result<RelayOutcome, RelayError> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut stats = RelayStats::default();

        loop {
            if interrupt.is_triggered() {
                return Ok(RelayOutcome::Interrupted(stats));
            }

            // an interrupt shuts the socket down, so errors and EOF seen after
            // one belong to the interrupt, not to the server
            let n = match self.source.read_chunk(&mut buf) {
                Ok(n) => n,
                Err(e) if interrupt.is_triggered() => {
                    debug!("read aborted by interrupt: {e}");
                    return Ok(RelayOutcome::Interrupted(stats));
                }
                Err(e) => return Err(e),
            };

            if n == 0 {
                if interrupt.is_triggered() {
                    return Ok(RelayOutcome::Interrupted(stats));
                }
                return Ok(RelayOutcome::EndOfStream(stats));
            }

            match self.sink.write_chunk(&buf[..n]) {
                Ok(()) => {}
                // the player got the same SIGINT and went away
                Err(e) if interrupt.is_triggered() => {
                    debug!("write aborted by interrupt: {e}");
                    return Ok(RelayOutcome::Interrupted(stats));
                }
                Err(e) => return Err(e),
            }

            stats.chunks += 1;
            stats.bytes += n as u64;
            trace!(len = n, total = stats.bytes, "chunk forwarded");
        }
    }

    fn teardown(&mut self) {
        if self.state == RelayState::Closed {
            return;
        }
        transition(&mut self.state, RelayState::ShuttingDown);
        self.source.close();
        self.sink.close();
        transition(&mut self.state, RelayState::Closed);
    }
}

impl<S: AudioSource, P: PlaybackSink> Drop for Relay<S, P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn transition(state: &mut RelayState, next: RelayState) {
    debug!(from = ?*state, to = ?next, "relay state");
    *state = next;
}
