//! Stub `ProcessMemorySource` for targets without a platform implementation.
//! Keeps the engine buildable everywhere; process scanning simply reports
//! `EngineError::UnsupportedPlatform`.

use super::{ProcessMemorySource, RawRegion, ReadMemoryFlags};
use crate::error::EngineError;

pub struct UnsupportedProcessMemorySource;

impl ProcessMemorySource for UnsupportedProcessMemorySource {
    fn open(_pid: u32) -> Result<Self, EngineError> {
        Err(EngineError::UnsupportedPlatform)
    }

    fn image_name(&self) -> String {
        String::new()
    }

    fn list_regions(&self, _flags: ReadMemoryFlags) -> Result<Vec<RawRegion>, EngineError> {
        Err(EngineError::UnsupportedPlatform)
    }

    fn read_at(&self, _va: u64, _buf: &mut [u8]) -> Result<usize, EngineError> {
        Err(EngineError::UnsupportedPlatform)
    }
}
