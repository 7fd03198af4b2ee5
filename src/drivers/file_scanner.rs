//! Expands a CLI file target (single file, directory, directory+recurse, or
//! wildcard glob) into concrete files and runs the orchestrator over each.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::DecodeConfig;
use crate::error::EngineError;
use crate::filter::{Filter, WildcardMatcher};
use crate::progress::{CancellationToken, ProgressReporter};
use crate::result::ResultSink;
use crate::scanner::{scan, SourceIdentity};
use crate::source::file::FileSource;
use crate::source::ByteSource;

/// Raw, unvalidated scan request as the CLI collects it; turned into a
/// per-file `ScanConfig` once each file's length is known.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub start_offset: u64,
    pub bytes_to_scan: u64,
    pub buffer_size: usize,
    pub sync: bool,
}

pub struct FileScanner {
    cancel: CancellationToken,
    progress: ProgressReporter,
    parallel: bool,
}

impl FileScanner {
    pub fn new(cancel: CancellationToken, progress: ProgressReporter, parallel: bool) -> Self {
        Self { cancel, progress, parallel }
    }

    /// Expand `target` into the concrete files to scan. `target` may be a
    /// plain path (file or directory) or contain `*`/`?` wildcards, matched
    /// against entries of its parent directory.
    pub fn expand(target: &str, recurse: bool) -> std::result::Result<Vec<PathBuf>, EngineError> {
        let path = Path::new(target);
        if !has_wildcard(target) {
            if path.is_dir() {
                return Ok(Self::walk_dir(path, recurse));
            }
            return Ok(vec![path.to_path_buf()]);
        }

        let (dir, pattern) = match path.file_name() {
            Some(name) => (path.parent().unwrap_or_else(|| Path::new(".")), name.to_string_lossy().to_string()),
            None => (Path::new("."), target.to_string()),
        };
        let matcher = WildcardMatcher::compile(&pattern, Default::default())?;

        let mut matches = Vec::new();
        let walker = if recurse { WalkDir::new(dir) } else { WalkDir::new(dir).max_depth(1) };
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if matcher.is_match(&name) {
                matches.push(entry.path().to_path_buf());
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn walk_dir(dir: &Path, recurse: bool) -> Vec<PathBuf> {
        let walker = if recurse { WalkDir::new(dir) } else { WalkDir::new(dir).max_depth(1) };
        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    }

    /// Run a scan over every file in `targets`, skipping any file that
    /// equals `output_path` (a configured output sink). Files run one after
    /// another unless `parallel` was set, in which case each file gets its
    /// own scoped thread (mirrors the orchestrator's own per-decoder
    /// fan-out).
    pub fn run_all<K: ResultSink>(
        &self,
        targets: &[PathBuf],
        decode_cfg: &DecodeConfig,
        request: &ScanRequest,
        filter: Option<&Filter>,
        sink: &K,
        output_path: Option<&Path>,
    ) -> std::result::Result<(), EngineError> {
        let active: Vec<&PathBuf> = targets
            .iter()
            .filter(|path| output_path.map_or(true, |out| !paths_equal(path, out)))
            .collect();

        let results: Vec<(&Path, std::result::Result<(), EngineError>)> = if self.parallel && active.len() > 1 {
            std::thread::scope(|scope| {
                let handles: Vec<_> = active
                    .iter()
                    .map(|path| {
                        scope.spawn(move || {
                            (path.as_path(), self.run_one(path, decode_cfg, request, filter, sink))
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|_| (Path::new(""), Err(EngineError::SinkClosed))))
                    .collect()
            })
        } else {
            let mut out = Vec::with_capacity(active.len());
            for path in &active {
                if self.cancel.is_cancelled() {
                    break;
                }
                out.push((path.as_path(), self.run_one(path, decode_cfg, request, filter, sink)));
            }
            out
        };

        let attempted = results.len();
        let mut last_error = None;
        for (path, r) in results {
            if let Err(e) = r {
                tracing::warn!(file = %path.display(), error = %e, "skipping file");
                last_error = Some(e);
            } else {
                last_error = None;
            }
        }
        // A single failing target (the common case) should be a hard error;
        // a batch with at least one success should not abort on stragglers.
        if attempted == 1 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        Ok(())
    }

    fn run_one<K: ResultSink>(
        &self,
        path: &Path,
        decode_cfg: &DecodeConfig,
        request: &ScanRequest,
        filter: Option<&Filter>,
        sink: &K,
    ) -> std::result::Result<(), EngineError> {
        let mut source = FileSource::open(path)?;
        let scan_cfg = crate::config::ScanConfig::new(
            request.start_offset,
            request.bytes_to_scan,
            request.buffer_size,
            request.sync,
            source.len(),
        )?;
        let identity = SourceIdentity::File { path: path.display().to_string() };
        scan(&mut source, &identity, decode_cfg, &scan_cfg, filter, sink, &self.cancel, &self.progress)
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains('*') || s.contains('?')
}

fn paths_equal(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_single_file() {
        let mut tmp = std::env::temp_dir();
        tmp.push(format!("strex-fs-single-{}.bin", std::process::id()));
        std::fs::write(&tmp, b"x").unwrap();
        let found = FileScanner::expand(tmp.to_str().unwrap(), false).unwrap();
        assert_eq!(found, vec![tmp.clone()]);
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn expands_wildcard_glob() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("strex-fs-glob-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.bin"), b"x").unwrap();
        std::fs::write(dir.join("b.txt"), b"y").unwrap();

        let pattern = dir.join("*.bin");
        let found = FileScanner::expand(pattern.to_str().unwrap(), false).unwrap();
        assert_eq!(found, vec![dir.join("a.bin")]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn skips_output_path() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("strex-fs-skip-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.bin");
        let output = dir.join("out.txt");
        std::fs::write(&input, b"\x00Hello World\x00").unwrap();
        std::fs::write(&output, b"").unwrap();

        let scanner = FileScanner::new(CancellationToken::new(), ProgressReporter::new(), false);
        let decode_cfg = DecodeConfig { min_length: 3, encodings: crate::config::EncodingFlags::ASCII, ..DecodeConfig::default() };
        let request = ScanRequest { start_offset: 0, bytes_to_scan: 0, buffer_size: 1024, sync: true };
        let sink = crate::result::VecSink::new();

        scanner.run_all(&[input.clone(), output.clone()], &decode_cfg, &request, None, &sink, Some(&output)).unwrap();
        let results = sink.into_inner();
        assert_eq!(results.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
