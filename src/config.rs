use crate::error::RelayError;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5016;
pub const DEFAULT_PLAYER: &str = "paplay";

/// How long the player may keep playing buffered audio after its input closes.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest read issued against the source connection.
pub const MAX_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    S16Le,
}

impl SampleFormat {
    pub fn bytes(self) -> usize {
        match self {
            SampleFormat::S16Le => 2,
        }
    }

    pub fn bits(self) -> usize {
        self.bytes() * 8
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleFormat::S16Le => f.write_str("s16le"),
        }
    }
}

/// Raw PCM layout of the incoming stream. There is no header on the wire,
/// so both ends have to agree on this out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample: SampleFormat,
    pub channels: u16,
    pub rate: u32,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample: SampleFormat::S16Le,
            channels: 2,
            rate: 48000,
        }
    }
}

impl PcmFormat {
    pub fn frame_size(&self) -> usize {
        self.sample.bytes() * self.channels as usize
    }

    pub fn bytes_per_second(&self) -> usize {
        self.frame_size() * self.rate as usize
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{n} ch"),
        };
        if self.rate % 1000 == 0 {
            write!(f, "{} kHz", self.rate / 1000)?;
        } else {
            write!(f, "{:.1} kHz", self.rate as f64 / 1000.0)?;
        }
        write!(f, " / {}-bit / {}", self.sample.bits(), layout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub chunk_size: usize,
    pub format: PcmFormat,
    pub player: String,
    pub drain_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chunk_size: MAX_CHUNK_SIZE,
            format: PcmFormat::default(),
            player: DEFAULT_PLAYER.to_string(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(RelayError::InvalidConfig(format!(
                "chunk size must be between 1 and {MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if self.format.channels == 0 || self.format.rate == 0 {
            return Err(RelayError::InvalidConfig(format!(
                "unusable pcm format: {} channels at {} Hz",
                self.format.channels, self.format.rate
            )));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
