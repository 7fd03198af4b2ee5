//! String-extraction engine: scans files and process memory for runs of
//! printable ASCII / UTF-8 BMP / UTF-16LE BMP characters.
//!
//! The binary in `src/main.rs` is a thin CLI shell around this library;
//! everything that matters algorithmically lives here so it can be tested
//! without a process or a terminal.

pub mod block;
pub mod cli;
pub mod codec;
pub mod config;
pub mod drivers;
pub mod error;
pub mod filter;
pub mod platform;
pub mod progress;
pub mod result;
pub mod scanner;
pub mod sink;
pub mod source;

pub use config::{DecodeConfig, EncodingFlags, ScanConfig};
pub use error::EngineError;
pub use filter::{Filter, FilterOptions};
pub use progress::{CancellationToken, ProgressReporter};
pub use result::{EncodingTag, FileResult, ProcessResult, Result, ResultSink, VecSink};
