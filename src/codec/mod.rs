//! Decoder state machines: one per supported encoding, sharing the
//! `try_next_string` contract.

pub mod ascii;
pub mod utf16;
pub mod utf8;

use crate::config::DecodeConfig;
use crate::result::EncodingTag;

/// Result of one `try_next_string` call.
#[derive(Debug, Clone, PartialEq)]
pub enum NextString {
    Found { bytes_consumed_in_buf: usize, string_byte_length: usize, string: String },
    NotFound { bytes_consumed_in_buf: usize },
}

/// Shared contract every decoder implements: scan forward from a given
/// buffer offset and return the next printable run, if any, along with how
/// many bytes were consumed finding it.
pub trait Decoder {
    fn tag(&self) -> EncodingTag;
    fn try_next_string(&self, buf: &[u8], start_in_buf: usize, cfg: &DecodeConfig) -> NextString;
}

/// Per-buffer progress for one decoder. Reset at the start of every buffer;
/// `Idle -> Running -> Done`, where `Done` means `bytes_consumed ==
/// buffer_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderState {
    pub buffer_offset: usize,
    pub bytes_consumed: usize,
    pub running: bool,
}

impl DecoderState {
    pub fn new() -> Self {
        Self { buffer_offset: 0, bytes_consumed: 0, running: true }
    }

    pub fn is_done(&self, buffer_len: usize) -> bool {
        self.bytes_consumed >= buffer_len
    }
}

impl Default for DecoderState {
    fn default() -> Self {
        Self::new()
    }
}

/// Construct the concrete decoder for a tag.
pub fn decoder_for(tag: EncodingTag) -> Box<dyn Decoder + Send + Sync> {
    match tag {
        EncodingTag::Ascii => Box::new(ascii::AsciiDecoder),
        EncodingTag::Utf8 => Box::new(utf8::Utf8Decoder),
        EncodingTag::Unicode => Box::new(utf16::Utf16Decoder),
    }
}
