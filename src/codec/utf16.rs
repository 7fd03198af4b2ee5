//! UTF-16LE BMP decoder. Unit = 2 bytes little-endian; surrogates (high or
//! low) are valid 16-bit values but always terminate the run (no pair
//! reconstruction, surrogate pairs and astral codepoints are out of scope).

use crate::block::{self, UNASSIGNED};
use crate::config::DecodeConfig;
use crate::result::EncodingTag;

use super::{Decoder, NextString};

pub struct Utf16Decoder;

fn is_surrogate(cp: u16) -> bool {
    (0xD800..=0xDFFF).contains(&cp)
}

fn unit_printable(cp: u16, cfg: &DecodeConfig) -> bool {
    if is_surrogate(cp) {
        return false;
    }
    let byte_level_printable = if cp < 0x100 { block::is_printable(cp as u8, cfg.exclude_control) } else { true };
    if !byte_level_printable {
        return false;
    }
    let block_id = block::block_of(cp);
    block_id != UNASSIGNED && cfg.blocks.contains(block_id)
}

/// Read the little-endian `u16` at `buf[i..i+2]`, or `None` if that would
/// read past the end of `buf`.
fn read_unit(buf: &[u8], i: usize) -> Option<u16> {
    let bytes = buf.get(i..i + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

impl Decoder for Utf16Decoder {
    fn tag(&self) -> EncodingTag {
        EncodingTag::Unicode
    }

    fn try_next_string(&self, buf: &[u8], start_in_buf: usize, cfg: &DecodeConfig) -> NextString {
        let mut i = start_in_buf;
        let mut run_chars: Vec<u16> = Vec::new();

        let run_start_block = loop {
            match read_unit(buf, i) {
                None => return NextString::NotFound { bytes_consumed_in_buf: i - start_in_buf },
                Some(cp) if unit_printable(cp, cfg) => {
                    let block_id = block::block_of(cp);
                    i += 2;
                    run_chars.push(cp);
                    break block_id;
                }
                Some(_) => i += 2,
            }
        };

        loop {
            match read_unit(buf, i) {
                Some(cp) if unit_printable(cp, cfg) && block::blocks_compatible(block::block_of(cp), run_start_block) => {
                    run_chars.push(cp);
                    i += 2;
                }
                _ => break,
            }
        }

        if run_chars.len() >= cfg.min_length as usize {
            let string: String = run_chars.iter().map(|&u| char::from_u32(u as u32).unwrap_or('\u{FFFD}')).collect();
            let string_byte_length = run_chars.len() * 2;
            NextString::Found {
                bytes_consumed_in_buf: i - start_in_buf,
                string_byte_length,
                string,
            }
        } else {
            NextString::NotFound { bytes_consumed_in_buf: i - start_in_buf }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::UnicodeBlockSet;

    fn cfg(min_length: u32, blocks: UnicodeBlockSet, exclude_control: bool) -> DecodeConfig {
        DecodeConfig { min_length, blocks, exclude_control, ..DecodeConfig::default() }
    }

    #[test]
    fn scenario_d_utf16_run() {
        let buf = [0x48, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00, 0x00, 0x00, 0x42, 0x00];
        let decoder = Utf16Decoder;
        let c = cfg(3, UnicodeBlockSet::default(), false);
        let r = decoder.try_next_string(&buf, 0, &c);
        assert_eq!(
            r,
            NextString::Found { bytes_consumed_in_buf: 10, string_byte_length: 10, string: "Hello".into() }
        );
    }

    #[test]
    fn surrogate_terminates_run() {
        // "AB" then a lone high surrogate 0xD800, then "CD".
        let mut buf = vec![0x41, 0x00, 0x42, 0x00];
        buf.extend_from_slice(&0xD800u16.to_le_bytes());
        buf.extend_from_slice(&[0x43, 0x00, 0x44, 0x00]);
        let decoder = Utf16Decoder;
        let c = cfg(2, UnicodeBlockSet::default(), false);
        let r = decoder.try_next_string(&buf, 0, &c);
        assert_eq!(r, NextString::Found { bytes_consumed_in_buf: 4, string_byte_length: 4, string: "AB".into() });
    }

    #[test]
    fn dangling_trailing_byte_does_not_block_the_leading_unit() {
        let buf = [0x41, 0x00, 0x42];
        let decoder = Utf16Decoder;
        let c = cfg(1, UnicodeBlockSet::default(), false);
        let r = decoder.try_next_string(&buf, 0, &c);
        assert_eq!(r, NextString::Found { bytes_consumed_in_buf: 2, string_byte_length: 2, string: "A".into() });
    }
}
