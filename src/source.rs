use crate::error::RelayError;
use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};
use tracing::{debug, info};

/// Where raw PCM comes from. `read_chunk` returning 0 means end of stream.
pub trait AudioSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, RelayError>;

    fn close(&mut self);
}

/// Outbound TCP connection to the PCM server. Read-only; nothing is ever sent.
pub struct SourceConnection {
    stream: Option<TcpStream>,
}

impl SourceConnection {
    pub fn connect(host: &str, port: u16) -> Result<Self, RelayError> {
        let stream = TcpStream::connect((host, port)).map_err(|source| RelayError::Connection {
            endpoint: format!("{host}:{port}"),
            source,
        })?;

        match stream.peer_addr() {
            Ok(peer) => info!(%peer, "connected to pcm source"),
            Err(_) => info!(host, port, "connected to pcm source"),
        }

        Ok(Self {
            stream: Some(stream),
        })
    }

    /// Second handle on the same socket. Shutting it down wakes a blocked read.
    pub fn shutdown_handle(&self) -> io::Result<TcpStream> {
        match &self.stream {
            Some(stream) => stream.try_clone(),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "source closed")),
        }
    }
}

impl AudioSource for SourceConnection {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, RelayError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };

        loop {
            match stream.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RelayError::Read(e)),
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // already shut down by the interrupt hook is fine
            let _ = stream.shutdown(Shutdown::Both);
            debug!("source connection closed");
        }
    }
}

impl Drop for SourceConnection {
    fn drop(&mut self) {
        self.close();
    }
}
