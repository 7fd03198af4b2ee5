//! The narrow boundary between the platform-independent engine and OS
//! process-introspection primitives. `MemoryRegionType` and `ReadMemoryFlags`
//! are plain data; `ProcessMemorySource` is the only trait a target needs to
//! implement to make process scanning available.

use crate::error::EngineError;

#[cfg(windows)]
mod windows;
#[cfg(not(windows))]
mod unsupported;

#[cfg(windows)]
pub use windows::WindowsProcessMemorySource as DefaultProcessMemorySource;
#[cfg(not(windows))]
pub use unsupported::UnsupportedProcessMemorySource as DefaultProcessMemorySource;

/// Classification of a committed virtual-memory region, following the NT
/// memory-manager vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegionType {
    Unknown,
    Teb,
    Peb,
    UserSharedData,
    HypervisorSharedData,
    CfgBitmap,
    ApiSetMap,
    ReadOnlySharedMemory,
    CodePageData,
    GdiSharedHandleTable,
    ShimData,
    ActivationContextData,
    ProcessActivationContext,
    SystemActivationContext,
    WerRegistrationData,
    SiloSharedData,
    TelemetryCoverage,
    Stack,
    NtHeap,
    NtLfhHeap,
    SegmentHeap,
    NtHeapSegment,
    NtLfhSegment,
    SegmentHeapSegment,
    PrivateData,
    MappedFile,
    Shareable,
    Image,
}

impl MemoryRegionType {
    fn is_heap(self) -> bool {
        matches!(
            self,
            MemoryRegionType::NtHeap
                | MemoryRegionType::NtLfhHeap
                | MemoryRegionType::SegmentHeap
                | MemoryRegionType::NtHeapSegment
                | MemoryRegionType::NtLfhSegment
                | MemoryRegionType::SegmentHeapSegment
        )
    }

    fn is_private(self) -> bool {
        self.is_heap()
            || matches!(
                self,
                MemoryRegionType::Stack
                    | MemoryRegionType::PrivateData
                    | MemoryRegionType::Unknown
                    | MemoryRegionType::Teb
                    | MemoryRegionType::Peb
                    | MemoryRegionType::UserSharedData
                    | MemoryRegionType::HypervisorSharedData
                    | MemoryRegionType::CfgBitmap
                    | MemoryRegionType::ApiSetMap
                    | MemoryRegionType::ReadOnlySharedMemory
                    | MemoryRegionType::CodePageData
                    | MemoryRegionType::GdiSharedHandleTable
                    | MemoryRegionType::ShimData
                    | MemoryRegionType::ActivationContextData
                    | MemoryRegionType::ProcessActivationContext
                    | MemoryRegionType::SystemActivationContext
                    | MemoryRegionType::WerRegistrationData
                    | MemoryRegionType::SiloSharedData
                    | MemoryRegionType::TelemetryCoverage
            )
    }
}

bitflags::bitflags! {
    /// Which region types a `ProcessStream` retains. Groups mirror the
    /// aggregate groupings defined over `MemoryRegionType`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReadMemoryFlags: u32 {
        const STACK       = 0b0000_0001;
        const HEAP        = 0b0000_0010;
        const PRIVATE     = 0b0000_0100;
        const MAPPED_FILE = 0b0000_1000;
        const SHAREABLE   = 0b0001_0000;
        const IMAGE       = 0b0010_0000;

        const MAPPED = Self::MAPPED_FILE.bits() | Self::SHAREABLE.bits();
        const ALL = Self::STACK.bits() | Self::HEAP.bits() | Self::PRIVATE.bits()
            | Self::MAPPED_FILE.bits() | Self::SHAREABLE.bits() | Self::IMAGE.bits();
    }
}

impl ReadMemoryFlags {
    /// Does this filter retain regions of `ty`?
    pub fn admits(self, ty: MemoryRegionType) -> bool {
        match ty {
            MemoryRegionType::Stack => self.contains(Self::STACK) || self.contains(Self::PRIVATE),
            _ if ty.is_heap() => self.contains(Self::HEAP) || self.contains(Self::PRIVATE),
            MemoryRegionType::MappedFile => self.contains(Self::MAPPED_FILE),
            MemoryRegionType::Shareable => self.contains(Self::SHAREABLE),
            MemoryRegionType::Image => self.contains(Self::IMAGE),
            _ if ty.is_private() => self.contains(Self::PRIVATE),
            _ => false,
        }
    }
}

/// One committed region as reported by the platform layer, before the
/// process source assigns logical offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRegion {
    pub base_va: u64,
    pub size: u64,
    pub region_type: MemoryRegionType,
    /// Thread id / heap id / mapped file path, or empty.
    pub detail: String,
}

/// Everything a target must implement to make process scanning available.
/// The real implementation talks to the OS; the engine never does so
/// directly.
pub trait ProcessMemorySource: Send + Sync {
    /// Open `pid` with read + query rights.
    fn open(pid: u32) -> std::result::Result<Self, EngineError>
    where
        Self: Sized;

    /// The process's image name (executable base name), best-effort.
    fn image_name(&self) -> String;

    /// Enumerate committed regions, already filtered by `flags`.
    fn list_regions(&self, flags: ReadMemoryFlags) -> std::result::Result<Vec<RawRegion>, EngineError>;

    /// Read up to `buf.len()` bytes starting at virtual address `va`.
    /// Returns the number of bytes actually read; a failed read (region no
    /// longer committed) returns `Ok(0)`, never an error.
    fn read_at(&self, va: u64, buf: &mut [u8]) -> std::result::Result<usize, EngineError>;
}
