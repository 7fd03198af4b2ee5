//! `ProcessStream`: a seekable, contiguous logical view over a process's
//! disjoint committed memory regions. The subtlest component in the engine:
//! logical offsets must be translated into region-relative reads, and reads
//! spanning a region boundary or a dead region must be handled gracefully.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EngineError;
use crate::platform::{MemoryRegionType, ProcessMemorySource, ReadMemoryFlags};

use super::ByteSource;

/// One retained region, already assigned its position in the logical
/// address space.
#[derive(Debug, Clone)]
struct Region {
    base_va: u64,
    size: u64,
    region_type: MemoryRegionType,
    detail: String,
    logical_offset: u64,
}

/// Everything needed to build a `Result::Process` record for a logical
/// offset, without the caller re-deriving region bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessStreamOffsetInfo {
    pub pid: u32,
    pub image_name: String,
    pub region_type: MemoryRegionType,
    pub region_base_va: u64,
    pub region_size: u64,
    pub detail: String,
    pub relative_va: u64,
}

pub struct ProcessStream<P: ProcessMemorySource> {
    source: P,
    pid: u32,
    image_name: String,
    regions: Vec<Region>,
    total_length: u64,
    position: u64,
    /// Index of the region used by the last read/seek/lookup; sequential
    /// access checks this before falling back to binary search. Atomic so
    /// `relative_offset_info` can be called concurrently from parallel
    /// decoder threads without needing `&mut self`.
    cached_region: AtomicUsize,
}

/// The platform's real process-memory source, parameterized the way the
/// rest of the engine expects `ProcessStream` to be used in production.
pub type DefaultProcessStream = ProcessStream<crate::platform::DefaultProcessMemorySource>;

impl<P: ProcessMemorySource> ProcessStream<P> {
    pub fn open(pid: u32, flags: ReadMemoryFlags) -> std::result::Result<Self, EngineError> {
        let source = P::open(pid)?;
        let image_name = source.image_name();
        let mut raw = source.list_regions(flags)?;
        raw.sort_by_key(|r| r.base_va);

        let mut regions = Vec::with_capacity(raw.len());
        let mut running = 0u64;
        for r in raw {
            regions.push(Region {
                base_va: r.base_va,
                size: r.size,
                region_type: r.region_type,
                detail: r.detail,
                logical_offset: running,
            });
            running += r.size;
        }

        Ok(Self {
            source,
            pid,
            image_name,
            regions,
            total_length: running,
            position: 0,
            cached_region: AtomicUsize::new(0),
        })
    }

    /// Index of the region containing logical offset `o`. Checks the
    /// cached region first (the common sequential-scan case), otherwise
    /// binary-searches on `logical_offset`.
    fn region_index_for(&self, o: u64) -> usize {
        let cached = self.cached_region.load(Ordering::Relaxed);
        if let Some(r) = self.regions.get(cached) {
            if r.logical_offset <= o && o < r.logical_offset + r.size {
                return cached;
            }
        }
        match self.regions.binary_search_by(|r| {
            if o < r.logical_offset {
                std::cmp::Ordering::Greater
            } else if o >= r.logical_offset + r.size {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        }) {
            Ok(idx) => idx,
            Err(idx) => idx.min(self.regions.len().saturating_sub(1)),
        }
    }

    /// Translate a logical offset into region-relative metadata. Takes
    /// `&self`, not `&mut self`: parallel decoder threads call this
    /// concurrently, each for its own offsets.
    pub fn relative_offset_info(&self, logical_offset: u64) -> Option<ProcessStreamOffsetInfo> {
        if self.regions.is_empty() || logical_offset >= self.total_length {
            return None;
        }
        let idx = self.region_index_for(logical_offset);
        self.cached_region.store(idx, Ordering::Relaxed);
        let r = &self.regions[idx];
        Some(ProcessStreamOffsetInfo {
            pid: self.pid,
            image_name: self.image_name.clone(),
            region_type: r.region_type,
            region_base_va: r.base_va,
            region_size: r.size,
            detail: r.detail.clone(),
            relative_va: r.base_va + (logical_offset - r.logical_offset),
        })
    }
}

impl<P: ProcessMemorySource> ByteSource for ProcessStream<P> {
    fn len(&self) -> u64 {
        self.total_length
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, offset: u64) {
        self.position = offset.min(self.total_length);
        if !self.regions.is_empty() {
            let idx = self.region_index_for(self.position);
            self.cached_region.store(idx, Ordering::Relaxed);
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, EngineError> {
        let mut filled = 0usize;
        while filled < buf.len() && self.position < self.total_length {
            let idx = self.region_index_for(self.position);
            self.cached_region.store(idx, Ordering::Relaxed);
            let region = &self.regions[idx];
            let region_relative = self.position - region.logical_offset;
            let region_remaining = region.size - region_relative;
            let want = ((buf.len() - filled) as u64).min(region_remaining) as usize;
            let va = region.base_va + region_relative;

            let n = self.source.read_at(va, &mut buf[filled..filled + want])?;
            if n == 0 {
                // Region no longer readable: skip past it, not fatal.
                self.position = region.logical_offset + region.size;
                continue;
            }
            filled += n;
            self.position += n as u64;
            if (n as u64) < want as u64 {
                break;
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RawRegion;
    use std::collections::HashMap;

    /// In-memory stand-in for a real OS process, so region translation and
    /// boundary handling can be unit-tested without a live target.
    struct FakeProcess {
        regions: Vec<RawRegion>,
        bytes: HashMap<u64, Vec<u8>>,
        /// Regions whose reads should fail (simulating decommitted memory).
        dead: Vec<u64>,
    }

    impl ProcessMemorySource for FakeProcess {
        fn open(_pid: u32) -> std::result::Result<Self, EngineError> {
            unreachable!("tests construct FakeProcess directly")
        }

        fn image_name(&self) -> String {
            "fake.exe".into()
        }

        fn list_regions(&self, _flags: ReadMemoryFlags) -> std::result::Result<Vec<RawRegion>, EngineError> {
            Ok(self.regions.clone())
        }

        fn read_at(&self, va: u64, buf: &mut [u8]) -> std::result::Result<usize, EngineError> {
            if self.dead.contains(&va) {
                return Ok(0);
            }
            for (base, data) in &self.bytes {
                if va >= *base && va < *base + data.len() as u64 {
                    let start = (va - base) as usize;
                    let n = (data.len() - start).min(buf.len());
                    buf[..n].copy_from_slice(&data[start..start + n]);
                    return Ok(n);
                }
            }
            Ok(0)
        }
    }

    fn stream_with(regions: Vec<RawRegion>, bytes: HashMap<u64, Vec<u8>>, dead: Vec<u64>) -> ProcessStream<FakeProcess> {
        let fake = FakeProcess { regions, bytes, dead };
        let image_name = fake.image_name();
        let mut raw = fake.regions.clone();
        raw.sort_by_key(|r| r.base_va);
        let mut regions = Vec::new();
        let mut running = 0u64;
        for r in raw {
            regions.push(Region {
                base_va: r.base_va,
                size: r.size,
                region_type: r.region_type,
                detail: r.detail,
                logical_offset: running,
            });
            running += r.size;
        }
        ProcessStream {
            source: fake,
            pid: 1234,
            image_name,
            regions,
            total_length: running,
            position: 0,
            cached_region: AtomicUsize::new(0),
        }
    }

    #[test]
    fn reads_across_region_boundary() {
        let regions = vec![
            RawRegion { base_va: 0x1000, size: 4, region_type: MemoryRegionType::Stack, detail: String::new() },
            RawRegion { base_va: 0x2000, size: 4, region_type: MemoryRegionType::NtHeap, detail: String::new() },
        ];
        let mut bytes = HashMap::new();
        bytes.insert(0x1000, vec![1, 2, 3, 4]);
        bytes.insert(0x2000, vec![5, 6, 7, 8]);
        let mut stream = stream_with(regions, bytes, vec![]);

        assert_eq!(stream.len(), 8);
        stream.seek(2);
        let mut buf = [0u8; 4];
        let n = stream.read(&mut buf).unwrap();
        // One read call spans both regions: 2 bytes from the tail of
        // region 0, then 2 more from the head of region 1.
        assert_eq!(n, 4);
        assert_eq!(&buf, &[3, 4, 5, 6]);

        let n2 = stream.read(&mut buf).unwrap();
        assert_eq!(n2, 2);
        assert_eq!(&buf[..2], &[7, 8]);
    }

    #[test]
    fn dead_region_is_skipped_not_fatal() {
        let regions = vec![
            RawRegion { base_va: 0x1000, size: 4, region_type: MemoryRegionType::PrivateData, detail: String::new() },
            RawRegion { base_va: 0x2000, size: 4, region_type: MemoryRegionType::PrivateData, detail: String::new() },
        ];
        let mut bytes = HashMap::new();
        bytes.insert(0x2000, vec![9, 9, 9, 9]);
        let mut stream = stream_with(regions, bytes, vec![0x1000]);

        let mut buf = [0u8; 8];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[..4], &[9, 9, 9, 9]);
    }

    #[test]
    fn relative_offset_info_is_left_inverse() {
        let regions = vec![
            RawRegion { base_va: 0x4000, size: 0x10, region_type: MemoryRegionType::Image, detail: "module.dll".into() },
        ];
        let stream = stream_with(regions, HashMap::new(), vec![]);
        let info = stream.relative_offset_info(5).unwrap();
        assert_eq!(info.relative_va, 0x4005);
        assert_eq!(info.region_type, MemoryRegionType::Image);
        assert_eq!(info.detail, "module.dll");
    }
}
