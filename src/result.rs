//! Result records and the sink interface the orchestrator emits through.

use crate::error::EngineError;
use crate::platform::MemoryRegionType;

/// Which decoder produced a `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingTag {
    Ascii,
    Utf8,
    Unicode,
}

impl std::fmt::Display for EncodingTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EncodingTag::Ascii => "ASCII",
            EncodingTag::Utf8 => "UTF8",
            EncodingTag::Unicode => "Unicode",
        };
        f.write_str(s)
    }
}

/// One emitted printable run, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Result {
    File(FileResult),
    Process(ProcessResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileResult {
    pub file: String,
    pub encoding: EncodingTag,
    pub offset_start: u64,
    pub offset_end: u64,
    pub string: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    pub pid: u32,
    pub name: String,
    pub region_type: MemoryRegionType,
    pub details: String,
    pub encoding: EncodingTag,
    pub offset_start: u64,
    pub offset_end: u64,
    pub string: String,
}

impl Result {
    pub fn offset_start(&self) -> u64 {
        match self {
            Result::File(r) => r.offset_start,
            Result::Process(r) => r.offset_start,
        }
    }

    pub fn string(&self) -> &str {
        match self {
            Result::File(r) => &r.string,
            Result::Process(r) => &r.string,
        }
    }

    pub fn encoding(&self) -> EncodingTag {
        match self {
            Result::File(r) => r.encoding,
            Result::Process(r) => r.encoding,
        }
    }
}

/// Write-only destination for `Result` records. Implementors must be
/// thread-safe: the parallel fan-out mode calls `emit` concurrently from
/// multiple decoder threads.
pub trait ResultSink: Send + Sync {
    fn emit(&self, result: Result) -> std::result::Result<(), EngineError>;
}

/// A sink that appends every `Result` to a `Mutex`-protected `Vec`, for
/// tests and for small one-shot invocations.
pub struct VecSink {
    inner: std::sync::Mutex<Vec<Result>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { inner: std::sync::Mutex::new(Vec::new()) }
    }

    pub fn into_inner(self) -> Vec<Result> {
        self.inner.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for VecSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for VecSink {
    fn emit(&self, result: Result) -> std::result::Result<(), EngineError> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).push(result);
        Ok(())
    }
}
