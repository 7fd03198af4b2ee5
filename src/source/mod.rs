//! Byte source abstraction consumed by the scan orchestrator.

pub mod file;
pub mod process;

use crate::error::EngineError;

/// Common interface over file and process byte sources.
pub trait ByteSource {
    fn len(&self) -> u64;
    fn position(&self) -> u64;
    fn seek(&mut self, offset: u64);
    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, EngineError>;
}

pub use file::FileSource;
pub use process::{ProcessStream, ProcessStreamOffsetInfo};
