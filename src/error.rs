//! Library-level error type. CLI-boundary errors are `anyhow::Error`; this
//! enum covers everything the engine itself can fail to do.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("min_length must be >= 1")]
    InvalidMinLength,

    #[error("buffer_size must be >= 1")]
    InvalidBufferSize,

    #[error("start_offset/bytes_to_scan out of range for a source of this length")]
    InvalidOffsetRange,

    #[error("invalid filter pattern: {0}")]
    InvalidFilterPattern(String),

    #[error("process memory introspection is not supported on this platform")]
    UnsupportedPlatform,

    #[error("failed to open process {pid}")]
    ProcessOpen { pid: u32, #[source] source: io::Error },

    #[error("failed to open file {path}", path = path.display())]
    FileOpen { path: PathBuf, #[source] source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("result sink is closed")]
    SinkClosed,
}
