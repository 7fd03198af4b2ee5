//! UTF-8 BMP decoder. Unit = 1–3 bytes encoding one BMP code point; a
//! well-formed 4-byte sequence (a supplementary-plane code point) is a
//! valid unit that always terminates the run, exactly like a malformed one.

use crate::block::{self, UNASSIGNED};
use crate::config::DecodeConfig;
use crate::result::EncodingTag;

use super::{Decoder, NextString};

pub struct Utf8Decoder;

/// One decoded UTF-8 unit, classified for the run-extension loop below.
enum Unit {
    /// 1–3 byte sequence decoding to a BMP code point.
    Bmp { codepoint: u32, len: usize },
    /// Well-formed but outside the BMP (4-byte lead), or malformed.
    Terminating { len: usize },
}

/// Decode the unit starting at `buf[i]`. Returns `None` when there isn't
/// enough of the buffer left to tell (the caller must not read past
/// `buf.len()`, so an incomplete trailing sequence is treated as end of
/// buffer, not as a parse failure).
fn decode_unit(buf: &[u8], i: usize) -> Option<Unit> {
    let lead = *buf.get(i)?;
    let len = if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        return Some(Unit::Terminating { len: 1 });
    };

    if i + len > buf.len() {
        return None;
    }

    for &b in &buf[i + 1..i + len] {
        if b & 0xC0 != 0x80 {
            return Some(Unit::Terminating { len: 1 });
        }
    }

    if len == 1 {
        return Some(Unit::Bmp { codepoint: lead as u32, len: 1 });
    }
    if len == 4 {
        return Some(Unit::Terminating { len: 4 });
    }

    let codepoint = match len {
        2 => ((lead as u32 & 0x1F) << 6) | (buf[i + 1] as u32 & 0x3F),
        3 => {
            ((lead as u32 & 0x0F) << 12) | ((buf[i + 1] as u32 & 0x3F) << 6) | (buf[i + 2] as u32 & 0x3F)
        }
        _ => unreachable!(),
    };
    Some(Unit::Bmp { codepoint, len })
}

fn unit_block(codepoint: u32, len: usize) -> u8 {
    if len == 1 {
        block::BASIC_LATIN
    } else {
        block::block_of(codepoint as u16)
    }
}

fn unit_printable(codepoint: u32, len: usize, cfg: &DecodeConfig) -> bool {
    if len == 1 {
        block::is_printable(codepoint as u8, cfg.exclude_control)
    } else {
        let block_id = unit_block(codepoint, len);
        block_id != UNASSIGNED && cfg.blocks.contains(block_id)
    }
}

impl Decoder for Utf8Decoder {
    fn tag(&self) -> EncodingTag {
        EncodingTag::Utf8
    }

    fn try_next_string(&self, buf: &[u8], start_in_buf: usize, cfg: &DecodeConfig) -> NextString {
        let mut i = start_in_buf;

        // Phase 1: find the first printable unit.
        let (run_start_block, mut run_char_count, mut run_byte_len) = loop {
            match decode_unit(buf, i) {
                None => return NextString::NotFound { bytes_consumed_in_buf: i - start_in_buf },
                Some(Unit::Bmp { codepoint, len }) if unit_printable(codepoint, len, cfg) => {
                    let block_id = unit_block(codepoint, len);
                    i += len;
                    break (block_id, 1usize, len);
                }
                Some(Unit::Bmp { len, .. }) | Some(Unit::Terminating { len }) => i += len,
            }
        };

        // Phase 2: extend the run.
        loop {
            match decode_unit(buf, i) {
                Some(Unit::Bmp { codepoint, len })
                    if unit_printable(codepoint, len, cfg)
                        && block::blocks_compatible(unit_block(codepoint, len), run_start_block) =>
                {
                    i += len;
                    run_char_count += 1;
                    run_byte_len += len;
                }
                _ => break,
            }
        }

        if run_char_count >= cfg.min_length as usize {
            let run_start_byte = i - run_byte_len;
            let string = String::from_utf8(buf[run_start_byte..i].to_vec())
                .expect("run bytes were validated unit-by-unit as well-formed UTF-8");
            NextString::Found {
                bytes_consumed_in_buf: i - start_in_buf,
                string_byte_length: run_byte_len,
                string,
            }
        } else {
            NextString::NotFound { bytes_consumed_in_buf: i - start_in_buf }
        }
    }
}
