//! 7-bit ASCII decoder. Unit = 1 byte; code point = byte value, always
//! `BasicLatin`, so the block check never applies.

use crate::block;
use crate::config::DecodeConfig;
use crate::result::EncodingTag;

use super::{Decoder, NextString};

pub struct AsciiDecoder;

impl Decoder for AsciiDecoder {
    fn tag(&self) -> EncodingTag {
        EncodingTag::Ascii
    }

    fn try_next_string(&self, buf: &[u8], start_in_buf: usize, cfg: &DecodeConfig) -> NextString {
        let mut i = start_in_buf;
        while i < buf.len() && !block::is_printable(buf[i], cfg.exclude_control) {
            i += 1;
        }
        if i == buf.len() {
            return NextString::NotFound { bytes_consumed_in_buf: i - start_in_buf };
        }

        let run_start = i;
        while i < buf.len() && block::is_printable(buf[i], cfg.exclude_control) {
            i += 1;
        }
        let run_len_chars = i - run_start;

        if run_len_chars >= cfg.min_length as usize {
            let string = String::from_utf8_lossy(&buf[run_start..i]).into_owned();
            NextString::Found {
                bytes_consumed_in_buf: i - start_in_buf,
                string_byte_length: i - run_start,
                string,
            }
        } else {
            NextString::NotFound { bytes_consumed_in_buf: i - start_in_buf }
        }
    }
}
