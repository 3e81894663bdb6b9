use std::io;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("cannot connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("read from source failed: {0}")]
    Read(#[source] io::Error),

    #[error("write to player failed: {0}")]
    Write(#[source] io::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
