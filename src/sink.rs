//! Plain-text result printer. The record schema is the engine's; formatting
//! it to a byte stream is the CLI's job.

use std::io::Write;
use std::sync::Mutex;

use crate::error::EngineError;
use crate::result::{Result, ResultSink};

/// Writes one line per `Result`: `offset_start(hex)\tencoding\t[pid\tregion\t]string`.
pub struct TextSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self { out: Mutex::new(writer) }
    }
}

impl<W: Write + Send> ResultSink for TextSink<W> {
    fn emit(&self, result: Result) -> std::result::Result<(), EngineError> {
        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        match result {
            Result::File(r) => {
                writeln!(out, "{:x}\t{}\t{}\t{}", r.offset_start, r.encoding, r.file, r.string).map_err(EngineError::Io)
            }
            Result::Process(r) => writeln!(
                out,
                "{:x}\t{}\t{}\t{:?}\t{}\t{}",
                r.offset_start, r.encoding, r.pid, r.region_type, r.details, r.string
            )
            .map_err(EngineError::Io),
        }
    }
}
