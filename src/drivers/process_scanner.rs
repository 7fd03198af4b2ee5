//! Iterates a list of process IDs and runs the orchestrator over each
//! process's memory.

use crate::config::DecodeConfig;
use crate::error::EngineError;
use crate::filter::Filter;
use crate::platform::{DefaultProcessMemorySource, ReadMemoryFlags};
use crate::progress::{CancellationToken, ProgressReporter};
use crate::result::ResultSink;
use crate::scanner::{scan, SourceIdentity};
use crate::source::process::ProcessStream;
use crate::source::ByteSource;

use super::file_scanner::ScanRequest;

pub struct ProcessScanner {
    cancel: CancellationToken,
    progress: ProgressReporter,
    parallel: bool,
}

impl ProcessScanner {
    pub fn new(cancel: CancellationToken, progress: ProgressReporter, parallel: bool) -> Self {
        Self { cancel, progress, parallel }
    }

    /// Run a scan over every pid in `pids`. A pid that fails to open is
    /// logged and skipped; the rest of the list still runs. Pids run one
    /// after another unless `parallel` was set, in which case each pid gets
    /// its own scoped thread.
    pub fn run_all<K: ResultSink>(
        &self,
        pids: &[u32],
        flags: ReadMemoryFlags,
        decode_cfg: &DecodeConfig,
        request: &ScanRequest,
        filter: Option<&Filter>,
        sink: &K,
    ) -> std::result::Result<(), EngineError> {
        let results: Vec<(u32, std::result::Result<(), EngineError>)> = if self.parallel && pids.len() > 1 {
            std::thread::scope(|scope| {
                let handles: Vec<_> = pids
                    .iter()
                    .map(|&pid| scope.spawn(move || (pid, self.run_one(pid, flags, decode_cfg, request, filter, sink))))
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap_or_else(|_| (0, Err(EngineError::SinkClosed))))
                    .collect()
            })
        } else {
            let mut out = Vec::with_capacity(pids.len());
            for &pid in pids {
                if self.cancel.is_cancelled() {
                    break;
                }
                out.push((pid, self.run_one(pid, flags, decode_cfg, request, filter, sink)));
            }
            out
        };

        let attempted = results.len();
        let mut last_error = None;
        for (pid, r) in results {
            if let Err(e) = r {
                tracing::warn!(pid, error = %e, "skipping process");
                last_error = Some(e);
            } else {
                last_error = None;
            }
        }
        // As with `FileScanner`, a lone failing pid is a hard error; a batch
        // with at least one success is not aborted by stragglers.
        if attempted == 1 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        Ok(())
    }

    fn run_one<K: ResultSink>(
        &self,
        pid: u32,
        flags: ReadMemoryFlags,
        decode_cfg: &DecodeConfig,
        request: &ScanRequest,
        filter: Option<&Filter>,
        sink: &K,
    ) -> std::result::Result<(), EngineError> {
        let mut source = ProcessStream::<DefaultProcessMemorySource>::open(pid, flags)?;
        let scan_cfg = crate::config::ScanConfig::new(
            request.start_offset,
            request.bytes_to_scan,
            request.buffer_size,
            request.sync,
            source.len(),
        )?;
        scan(&mut source, &SourceIdentity::Process, decode_cfg, &scan_cfg, filter, sink, &self.cancel, &self.progress)
    }
}

