mod process;
pub use process::ProcessSink;

use crate::config::PcmFormat;
use crate::error::RelayError;

/// Anything that can swallow raw PCM in the negotiated [`PcmFormat`].
pub trait PlaybackSink {
    /// Writes the whole chunk or fails. Blocks while the player is behind.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), RelayError>;

    fn close(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlayerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// PulseAudio `paplay` reading headerless samples from stdin.
    pub fn paplay(program: impl Into<String>, format: &PcmFormat) -> Self {
        Self::new(program)
            .arg(format!("--format={}", format.sample))
            .arg(format!("--channels={}", format.channels))
            .arg(format!("--rate={}", format.rate))
            .arg("--raw")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paplay_command_line() {
        let cmd = PlayerCommand::paplay("paplay", &PcmFormat::default());
        assert_eq!(cmd.program, "paplay");
        assert_eq!(
            cmd.args,
            ["--format=s16le", "--channels=2", "--rate=48000", "--raw"]
        );
    }
}
