//! Configuration structs. `DecodeConfig` governs decoding/filtering
//! semantics; `ScanConfig` governs how much of a source gets read and how.
//! Kept separate: "what/how to decode" versus "how much, from where".

use bitflags::bitflags;

use crate::block::UnicodeBlockSet;
use crate::error::EngineError;

bitflags! {
    /// Which decoders a scan should run. `effective_encodings` (in
    /// `scanner`) applies the ASCII/UTF-8 coexistence rule to this set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EncodingFlags: u8 {
        const ASCII   = 0b001;
        const UTF8    = 0b010;
        const UNICODE = 0b100;
    }
}

impl Default for EncodingFlags {
    fn default() -> Self {
        EncodingFlags::UTF8 | EncodingFlags::UNICODE
    }
}

/// Decoding and filtering semantics, immutable for the duration of a scan.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    pub min_length: u32,
    pub exclude_control: bool,
    pub is_unicode_console: bool,
    pub blocks: UnicodeBlockSet,
    pub encodings: EncodingFlags,
}

impl DecodeConfig {
    pub fn new(
        min_length: u32,
        exclude_control: bool,
        is_unicode_console: bool,
        blocks: UnicodeBlockSet,
        encodings: EncodingFlags,
    ) -> std::result::Result<Self, EngineError> {
        if min_length < 1 {
            return Err(EngineError::InvalidMinLength);
        }
        Ok(Self { min_length, exclude_control, is_unicode_console, blocks, encodings })
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            exclude_control: false,
            is_unicode_console: false,
            blocks: UnicodeBlockSet::default(),
            encodings: EncodingFlags::default(),
        }
    }
}

/// Streaming/scheduling semantics for one scan of one source.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub start_offset: u64,
    pub bytes_to_scan: u64,
    pub buffer_size: usize,
    pub sync: bool,
}

impl ScanConfig {
    pub const DEFAULT_BUFFER_SIZE: usize = 1 << 20;

    pub fn new(
        start_offset: u64,
        bytes_to_scan: u64,
        buffer_size: usize,
        sync: bool,
        source_len: u64,
    ) -> std::result::Result<Self, EngineError> {
        if buffer_size < 1 {
            return Err(EngineError::InvalidBufferSize);
        }
        if start_offset >= source_len && source_len > 0 {
            return Err(EngineError::InvalidOffsetRange);
        }
        if bytes_to_scan > source_len.saturating_sub(start_offset) {
            return Err(EngineError::InvalidOffsetRange);
        }
        let buffer_size = buffer_size.min(source_len.max(1) as usize).max(1);
        Ok(Self { start_offset, bytes_to_scan, buffer_size, sync })
    }

    /// How many bytes this scan should read in total.
    pub fn effective_bytes_to_scan(&self, source_len: u64) -> u64 {
        if self.bytes_to_scan == 0 {
            source_len.saturating_sub(self.start_offset)
        } else {
            self.bytes_to_scan
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            start_offset: 0,
            bytes_to_scan: 0,
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            sync: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_min_length() {
        assert!(matches!(
            DecodeConfig::new(0, false, false, UnicodeBlockSet::default(), EncodingFlags::default()),
            Err(EngineError::InvalidMinLength)
        ));
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(ScanConfig::new(100, 0, 4096, false, 10).is_err());
        assert!(ScanConfig::new(0, 100, 4096, false, 10).is_err());
        assert!(ScanConfig::new(0, 10, 4096, false, 10).is_ok());
    }

    #[test]
    fn clamps_buffer_size_to_source_len() {
        let cfg = ScanConfig::new(0, 0, 4096, false, 10).unwrap();
        assert_eq!(cfg.buffer_size, 10);
    }
}
