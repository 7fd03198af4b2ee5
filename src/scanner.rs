//! Scan orchestrator: reads fixed-size buffers from a byte source and, for
//! each buffer, runs every configured decoder, applies the optional filter,
//! and emits results through the sink.

use crate::codec::{decoder_for, DecoderState, NextString};
use crate::config::{DecodeConfig, EncodingFlags, ScanConfig};
use crate::error::EngineError;
use crate::filter::Filter;
use crate::platform::{MemoryRegionType, ProcessMemorySource};
use crate::progress::{CancellationToken, ProgressReporter};
use crate::result::{EncodingTag, FileResult, ProcessResult, Result, ResultSink};
use crate::source::file::FileSource;
use crate::source::process::ProcessStream;
use crate::source::ByteSource;

/// Static identity a scan attaches to every result it emits. The per-offset
/// process metadata (region, VA, detail) instead comes from
/// `ScanSource::offset_info`, since it varies per result.
pub enum SourceIdentity {
    File { path: String },
    Process,
}

/// Anything `scan()` can read from *and* translate offsets for. `FileSource`
/// never has process metadata; `ProcessStream` always does.
pub trait ScanSource: ByteSource {
    fn offset_info(&self, logical_offset: u64) -> OffsetInfo;
}

pub enum OffsetInfo {
    File,
    Process { pid: u32, name: String, region_type: MemoryRegionType, detail: String, relative_va: u64 },
}

impl ScanSource for FileSource {
    fn offset_info(&self, _logical_offset: u64) -> OffsetInfo {
        OffsetInfo::File
    }
}

impl<P: ProcessMemorySource> ScanSource for ProcessStream<P> {
    fn offset_info(&self, logical_offset: u64) -> OffsetInfo {
        match self.relative_offset_info(logical_offset) {
            Some(info) => OffsetInfo::Process {
                pid: info.pid,
                name: info.image_name,
                region_type: info.region_type,
                detail: info.detail,
                relative_va: info.relative_va,
            },
            None => OffsetInfo::Process {
                pid: 0,
                name: String::new(),
                region_type: MemoryRegionType::Unknown,
                detail: String::new(),
                relative_va: logical_offset,
            },
        }
    }
}

/// Apply the ASCII/UTF-8 coexistence rule and return the decoders to run,
/// in the fixed (ASCII, UTF-8, UTF-16) order.
pub fn effective_encodings(requested: EncodingFlags) -> Vec<EncodingTag> {
    let mut out = Vec::new();
    let utf8 = requested.contains(EncodingFlags::UTF8);
    let ascii = requested.contains(EncodingFlags::ASCII);
    if ascii && !utf8 {
        out.push(EncodingTag::Ascii);
    }
    if utf8 {
        out.push(EncodingTag::Utf8);
    }
    if requested.contains(EncodingFlags::UNICODE) {
        out.push(EncodingTag::Unicode);
    }
    out
}

fn build_result(
    identity: &SourceIdentity,
    offset_info: OffsetInfo,
    encoding: EncodingTag,
    offset_start: u64,
    offset_end: u64,
    string: String,
) -> Result {
    match (identity, offset_info) {
        (SourceIdentity::File { path }, _) => {
            Result::File(FileResult { file: path.clone(), encoding, offset_start, offset_end, string })
        }
        (SourceIdentity::Process, OffsetInfo::Process { pid, name, region_type, detail, relative_va }) => {
            let byte_len = offset_end - offset_start;
            Result::Process(ProcessResult {
                pid,
                name,
                region_type,
                details: detail,
                encoding,
                offset_start: relative_va,
                offset_end: relative_va + byte_len,
                string,
            })
        }
        (SourceIdentity::Process, OffsetInfo::File) => unreachable!("process identity always yields OffsetInfo::Process"),
    }
}

/// Run every decoder once over `buf`, feeding qualifying runs through
/// `filter` and `sink`. `sync` selects strictly sequential fan-out vs. one
/// scoped thread per decoder.
#[allow(clippy::too_many_arguments)]
fn run_all_decoders<S, K>(
    encodings: &[EncodingTag],
    buf: &[u8],
    buffer_base: u64,
    decode_cfg: &DecodeConfig,
    filter: Option<&Filter>,
    identity: &SourceIdentity,
    source: &S,
    sink: &K,
    cancel: &CancellationToken,
    sync: bool,
) -> std::result::Result<(), EngineError>
where
    S: ScanSource + Sync,
    K: ResultSink,
{
    if sync {
        for &tag in encodings {
            run_one_decoder(tag, buf, buffer_base, decode_cfg, filter, identity, source, sink, cancel)?;
        }
        Ok(())
    } else {
        std::thread::scope(|scope| -> std::result::Result<(), EngineError> {
            let handles: Vec<_> = encodings
                .iter()
                .map(|&tag| {
                    scope.spawn(move || {
                        run_one_decoder(tag, buf, buffer_base, decode_cfg, filter, identity, source, sink, cancel)
                    })
                })
                .collect();
            for h in handles {
                h.join().map_err(|_| EngineError::SinkClosed)??;
            }
            Ok(())
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn run_one_decoder<S, K>(
    tag: EncodingTag,
    buf: &[u8],
    buffer_base: u64,
    decode_cfg: &DecodeConfig,
    filter: Option<&Filter>,
    identity: &SourceIdentity,
    source: &S,
    sink: &K,
    cancel: &CancellationToken,
) -> std::result::Result<(), EngineError>
where
    S: ScanSource + Sync,
    K: ResultSink,
{
    let decoder = decoder_for(tag);
    let mut state = DecoderState::new();

    while !state.is_done(buf.len()) {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let call_start = state.bytes_consumed;
        match decoder.try_next_string(buf, call_start, decode_cfg) {
            NextString::Found { bytes_consumed_in_buf, string_byte_length, string } => {
                // `bytes_consumed_in_buf` covers the skipped bytes before the run
                // as well as the run itself; all three decoders stop consuming
                // exactly at the run's end, so the run's start is recoverable by
                // subtracting the run's own length back out.
                let run_start_in_buf = call_start + (bytes_consumed_in_buf - string_byte_length);
                let offset_start = buffer_base + run_start_in_buf as u64;
                let offset_end = offset_start + string_byte_length as u64;
                let passes = match filter {
                    Some(f) => f.is_match(&string),
                    None => true,
                };
                if passes {
                    let offset_info = source.offset_info(offset_start);
                    let result = build_result(identity, offset_info, tag, offset_start, offset_end, string);
                    sink.emit(result)?;
                }
                state.bytes_consumed = call_start + bytes_consumed_in_buf;
            }
            NextString::NotFound { bytes_consumed_in_buf } => {
                state.bytes_consumed = call_start + bytes_consumed_in_buf;
            }
        }
    }
    Ok(())
}

/// Drive one scan of `source` to completion: walk it buffer by buffer,
/// running every requested decoder over each buffer and forwarding matches
/// to `sink`.
#[allow(clippy::too_many_arguments)]
pub fn scan<S, K>(
    source: &mut S,
    identity: &SourceIdentity,
    decode_cfg: &DecodeConfig,
    scan_cfg: &ScanConfig,
    filter: Option<&Filter>,
    sink: &K,
    cancel: &CancellationToken,
    progress: &ProgressReporter,
) -> std::result::Result<(), EngineError>
where
    S: ScanSource + Sync,
    K: ResultSink,
{
    let encodings = effective_encodings(decode_cfg.encodings);
    let mut buf = vec![0u8; scan_cfg.buffer_size];

    source.seek(scan_cfg.start_offset);
    let mut remaining = scan_cfg.effective_bytes_to_scan(source.len());

    while remaining > 0 && !cancel.is_cancelled() {
        let want = (scan_cfg.buffer_size as u64).min(remaining) as usize;
        let n = source.read(&mut buf[..want])?;
        if n == 0 {
            break;
        }
        remaining = remaining.saturating_sub(n as u64);
        let buffer_base = source.position() - n as u64;

        run_all_decoders(&encodings, &buf[..n], buffer_base, decode_cfg, filter, identity, &*source, sink, cancel, scan_cfg.sync)?;

        progress.add(n as u64);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::UnicodeBlockSet;
    use crate::result::VecSink;

    struct SliceSource {
        data: Vec<u8>,
        position: u64,
    }

    impl ByteSource for SliceSource {
        fn len(&self) -> u64 {
            self.data.len() as u64
        }
        fn position(&self) -> u64 {
            self.position
        }
        fn seek(&mut self, offset: u64) {
            self.position = offset;
        }
        fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, EngineError> {
            let start = self.position as usize;
            let n = (self.data.len() - start).min(buf.len());
            buf[..n].copy_from_slice(&self.data[start..start + n]);
            self.position += n as u64;
            Ok(n)
        }
    }

    impl ScanSource for SliceSource {
        fn offset_info(&self, _logical_offset: u64) -> OffsetInfo {
            OffsetInfo::File
        }
    }

    #[test]
    fn effective_encodings_drops_ascii_when_utf8_present() {
        let flags = EncodingFlags::ASCII | EncodingFlags::UTF8;
        assert_eq!(effective_encodings(flags), vec![EncodingTag::Utf8]);

        let flags2 = EncodingFlags::ASCII;
        assert_eq!(effective_encodings(flags2), vec![EncodingTag::Ascii]);

        let flags3 = EncodingFlags::ASCII | EncodingFlags::UTF8 | EncodingFlags::UNICODE;
        assert_eq!(effective_encodings(flags3), vec![EncodingTag::Utf8, EncodingTag::Unicode]);
    }

    #[test]
    fn scenario_a_end_to_end_sync() {
        let data = vec![0x00, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64, 0x00, 0x41, 0x42];
        let mut source = SliceSource { data, position: 0 };
        let decode_cfg = DecodeConfig {
            min_length: 3,
            encodings: EncodingFlags::ASCII,
            blocks: UnicodeBlockSet::default(),
            ..DecodeConfig::default()
        };
        let scan_cfg = ScanConfig { sync: true, ..ScanConfig::default() };
        let sink = VecSink::new();
        let identity = SourceIdentity::File { path: "test.bin".into() };

        scan(&mut source, &identity, &decode_cfg, &scan_cfg, None, &sink, &CancellationToken::new(), &ProgressReporter::new()).unwrap();

        let results = sink.into_inner();
        assert_eq!(results.len(), 1);
        match &results[0] {
            Result::File(r) => {
                assert_eq!(r.string, "Hello World");
                assert_eq!(r.offset_start, 1);
                assert_eq!(r.offset_end, 12);
                assert_eq!(r.encoding, EncodingTag::Ascii);
            }
            _ => panic!("expected a file result"),
        }
    }

    #[test]
    fn scenario_f_filter_suppresses_non_matching() {
        let data = b"\x00Hello World\x00AB".to_vec();
        let mut source = SliceSource { data, position: 0 };
        let decode_cfg = DecodeConfig { min_length: 3, encodings: EncodingFlags::ASCII, ..DecodeConfig::default() };
        let scan_cfg = ScanConfig { sync: true, ..ScanConfig::default() };
        let identity = SourceIdentity::File { path: "test.bin".into() };

        let filter = Filter::regex("^world$", crate::filter::FilterOptions::default()).unwrap();
        let sink = VecSink::new();
        scan(&mut source, &identity, &decode_cfg, &scan_cfg, Some(&filter), &sink, &CancellationToken::new(), &ProgressReporter::new()).unwrap();
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn offsets_strictly_ascending_across_buffers() {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(b"\x00ABCD");
        }
        let mut source = SliceSource { data, position: 0 };
        let decode_cfg = DecodeConfig { min_length: 3, encodings: EncodingFlags::ASCII, ..DecodeConfig::default() };
        let scan_cfg = ScanConfig { sync: true, buffer_size: 6, ..ScanConfig::default() };
        let identity = SourceIdentity::File { path: "test.bin".into() };
        let sink = VecSink::new();

        scan(&mut source, &identity, &decode_cfg, &scan_cfg, None, &sink, &CancellationToken::new(), &ProgressReporter::new()).unwrap();
        let results = sink.into_inner();
        let mut last = None;
        for r in &results {
            if let Some(prev) = last {
                assert!(r.offset_start() > prev);
            }
            last = Some(r.offset_start());
        }
        assert!(!results.is_empty());
    }
}
