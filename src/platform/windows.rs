//! Windows process-memory introspection, implemented with hand-written
//! `extern "system"` bindings to the `kernel32` entry points this needs,
//! rather than a full binding crate: only the handful of types and calls
//! actually used get declared.

use std::ffi::c_void;

use super::{MemoryRegionType, ProcessMemorySource, RawRegion, ReadMemoryFlags};
use crate::error::EngineError;

type Handle = *mut c_void;
type Bool = i32;
type DWord = u32;
type SizeT = usize;

const PROCESS_QUERY_INFORMATION: DWord = 0x0400;
const PROCESS_VM_READ: DWord = 0x0010;

const MEM_COMMIT: DWord = 0x1000;
const MEM_IMAGE: DWord = 0x1000000;
const MEM_MAPPED: DWord = 0x40000;
const MEM_PRIVATE: DWord = 0x20000;

/// Mirrors `MEMORY_BASIC_INFORMATION` on x86_64 Windows.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct MemoryBasicInformation {
    base_address: u64,
    allocation_base: u64,
    allocation_protect: DWord,
    partition_id: u16,
    region_size: SizeT,
    state: DWord,
    protect: DWord,
    ty: DWord,
}

extern "system" {
    fn OpenProcess(desired_access: DWord, inherit_handle: Bool, process_id: DWord) -> Handle;
    fn CloseHandle(handle: Handle) -> Bool;
    fn VirtualQueryEx(
        process: Handle,
        address: *const c_void,
        buffer: *mut MemoryBasicInformation,
        length: SizeT,
    ) -> SizeT;
    fn ReadProcessMemory(
        process: Handle,
        base_address: *const c_void,
        buffer: *mut c_void,
        size: SizeT,
        bytes_read: *mut SizeT,
    ) -> Bool;
}

pub struct WindowsProcessMemorySource {
    handle: Handle,
    pid: u32,
}

// SAFETY: the handle is only read/passed to the Win32 calls above, which are
// documented as safe to call from any thread.
unsafe impl Send for WindowsProcessMemorySource {}
unsafe impl Sync for WindowsProcessMemorySource {}

impl ProcessMemorySource for WindowsProcessMemorySource {
    fn open(pid: u32) -> Result<Self, EngineError> {
        let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, 0, pid) };
        if handle.is_null() {
            return Err(EngineError::ProcessOpen { pid, source: std::io::Error::last_os_error() });
        }
        Ok(Self { handle, pid })
    }

    fn image_name(&self) -> String {
        // Resolving the module name requires `K32GetModuleBaseNameW`, a
        // separate `psapi` import; left unresolved rather than faked.
        format!("pid-{}", self.pid)
    }

    fn list_regions(&self, flags: ReadMemoryFlags) -> Result<Vec<RawRegion>, EngineError> {
        let mut regions = Vec::new();
        let mut address: u64 = 0;
        loop {
            let mut mbi = MemoryBasicInformation::default();
            let written = unsafe {
                VirtualQueryEx(
                    self.handle,
                    address as *const c_void,
                    &mut mbi,
                    std::mem::size_of::<MemoryBasicInformation>(),
                )
            };
            if written == 0 {
                break;
            }
            if mbi.state == MEM_COMMIT {
                let region_type = classify(mbi.ty);
                if flags.admits(region_type) {
                    regions.push(RawRegion {
                        base_va: mbi.base_address,
                        size: mbi.region_size as u64,
                        region_type,
                        detail: String::new(),
                    });
                }
            }
            let next = mbi.base_address.saturating_add(mbi.region_size as u64);
            if next <= address {
                break;
            }
            address = next;
        }
        Ok(regions)
    }

    fn read_at(&self, va: u64, buf: &mut [u8]) -> Result<usize, EngineError> {
        let mut bytes_read: SizeT = 0;
        let ok = unsafe {
            ReadProcessMemory(
                self.handle,
                va as *const c_void,
                buf.as_mut_ptr() as *mut c_void,
                buf.len(),
                &mut bytes_read,
            )
        };
        if ok == 0 {
            // Region went away between enumeration and read: non-fatal.
            return Ok(0);
        }
        Ok(bytes_read)
    }
}

fn classify(ty: DWord) -> MemoryRegionType {
    if ty == MEM_IMAGE {
        MemoryRegionType::Image
    } else if ty == MEM_MAPPED {
        MemoryRegionType::MappedFile
    } else if ty == MEM_PRIVATE {
        MemoryRegionType::PrivateData
    } else {
        MemoryRegionType::Unknown
    }
}

impl Drop for WindowsProcessMemorySource {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_types() {
        assert_eq!(classify(MEM_IMAGE), MemoryRegionType::Image);
        assert_eq!(classify(MEM_MAPPED), MemoryRegionType::MappedFile);
        assert_eq!(classify(MEM_PRIVATE), MemoryRegionType::PrivateData);
        assert_eq!(classify(0), MemoryRegionType::Unknown);
    }
}
