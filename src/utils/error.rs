use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidConfig(#[from] config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// The trace directory is missing or holds no usable trace
    #[error("no usable traces in {dir}: {reason}")]
    Load { dir: PathBuf, reason: String },
    /// A policy returned an out-of-range level. Never clamped: clamping
    /// would mask policy bugs.
    #[error("bitrate level {level} out of range, the ladder has {levels} levels")]
    InvalidBitrate { level: usize, levels: usize },
    /// The trace cannot deliver the requested bytes within the walk budget,
    /// e.g. its bandwidth is zero everywhere
    #[error("trace {trace} delivers no data within the iteration budget")]
    TraceExhausted { trace: String },
    #[error(transparent)]
    Others(#[from] anyhow::Error),
}

/// A type alias that forces the usage of the custom error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tracing::subscriber::SetGlobalDefaultError> for Error {
    fn from(err: tracing::subscriber::SetGlobalDefaultError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}

impl From<tracing_subscriber::util::TryInitError> for Error {
    fn from(err: tracing_subscriber::util::TryInitError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}
