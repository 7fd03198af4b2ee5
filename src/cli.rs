//! Command-line surface: argument parsing and translation into the engine's
//! config types. Parsing itself is out of the engine's scope; this module is
//! the CLI-side collaborator the binary wires up.

use std::path::PathBuf;

use clap::Parser;

use crate::block::UnicodeBlockSet;
use crate::config::{DecodeConfig, EncodingFlags, ScanConfig};
use crate::drivers::file_scanner::ScanRequest;
use crate::filter::{Filter, FilterOptions};
use crate::platform::ReadMemoryFlags;

/// Extract printable character runs from files or from a running process's
/// memory.
#[derive(Parser, Debug)]
#[command(name = "strex", version, about, long_about = None)]
pub struct Cli {
    /// File, directory, or wildcard glob (e.g. `logs/*.bin`) to scan.
    /// Mutually exclusive with `--pid`.
    pub target: Option<String>,

    /// Scan this process's live memory instead of a file. May be repeated.
    #[arg(long, value_name = "PID")]
    pub pid: Vec<u32>,

    /// Recurse into subdirectories when `target` is a directory.
    #[arg(short, long)]
    pub recurse: bool,

    /// Minimum run length, in characters, to report.
    #[arg(short = 'n', long, default_value_t = 3)]
    pub min_length: u32,

    /// Comma-separated encodings to search: any of ASCII, UTF8, Unicode.
    #[arg(short, long, default_value = "UTF8,Unicode")]
    pub encoding: String,

    /// Comma-separated Unicode block names to admit, or `All`.
    #[arg(short = 'u', long = "unicode-blocks", default_value = "BasicLatin")]
    pub unicode_blocks: String,

    /// Treat HT/LF/CR as non-printable.
    #[arg(long)]
    pub exclude_control: bool,

    /// Decode as if writing to a Unicode-aware console (affects no decoder
    /// semantics directly; threaded through for output-layer consumers).
    #[arg(long)]
    pub unicode_console: bool,

    /// Byte offset to start scanning at.
    #[arg(short = 's', long, default_value_t = 0)]
    pub start_offset: u64,

    /// Number of bytes to scan; 0 means "to the end".
    #[arg(short = 't', long, default_value_t = 0)]
    pub bytes_to_scan: u64,

    /// Read buffer size in bytes.
    #[arg(short = 'b', long, default_value_t = ScanConfig::DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,

    /// Disable per-buffer decoder parallelism.
    #[arg(long)]
    pub sync: bool,

    /// Scan multiple files or processes concurrently, one scoped thread
    /// each, instead of one after another.
    #[arg(long)]
    pub parallel: bool,

    /// Post-filter results with a regular expression.
    #[arg(long, conflicts_with = "wildcard")]
    pub regex: Option<String>,

    /// Post-filter results with a shell-style wildcard (`*`, `?`, `[set]`).
    #[arg(long)]
    pub wildcard: Option<String>,

    /// Make `--regex`/`--wildcard` case-insensitive.
    #[arg(short = 'i', long)]
    pub case_insensitive: bool,

    /// `^`/`$` in `--regex` match line boundaries, not string boundaries.
    #[arg(long)]
    pub multi_line: bool,

    /// Comma-separated memory region kinds to scan for `--pid` (Stack, Heap,
    /// Private, MappedFile, Shareable, Mapped, Image, All).
    #[arg(long, default_value = "All")]
    pub memory_regions: String,

    /// Write results here instead of stdout. Also excluded from file-target
    /// expansion so the output never scans itself.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Everything `main` needs to run the scan(s) the CLI described, already
/// validated.
pub struct ResolvedConfig {
    pub decode: DecodeConfig,
    pub request: ScanRequest,
    pub filter: Option<Filter>,
    pub memory_flags: ReadMemoryFlags,
    pub recurse: bool,
    pub parallel: bool,
    pub output: Option<PathBuf>,
}

pub fn build_config(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    let encodings = parse_encoding_flags(&cli.encoding)?;
    let blocks: UnicodeBlockSet = cli.unicode_blocks.parse().map_err(anyhow::Error::msg)?;
    let decode = DecodeConfig::new(cli.min_length, cli.exclude_control, cli.unicode_console, blocks, encodings)?;

    let request = ScanRequest {
        start_offset: cli.start_offset,
        bytes_to_scan: cli.bytes_to_scan,
        buffer_size: cli.buffer_size,
        sync: cli.sync,
    };

    let filter_options = FilterOptions { case_insensitive: cli.case_insensitive, multi_line: cli.multi_line };
    let filter = match (&cli.regex, &cli.wildcard) {
        (Some(pattern), None) => Some(Filter::regex(pattern, filter_options)?),
        (None, Some(pattern)) => Some(Filter::wildcard(pattern, filter_options)?),
        (None, None) => None,
        (Some(_), Some(_)) => unreachable!("clap rejects --regex with --wildcard"),
    };

    let memory_flags = parse_memory_flags(&cli.memory_regions)?;

    Ok(ResolvedConfig {
        decode,
        request,
        filter,
        memory_flags,
        recurse: cli.recurse,
        parallel: cli.parallel,
        output: cli.output.clone(),
    })
}

fn parse_encoding_flags(s: &str) -> anyhow::Result<EncodingFlags> {
    let mut flags = EncodingFlags::empty();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        flags |= match_ignore_case(part)?;
    }
    Ok(flags)
}

fn match_ignore_case(part: &str) -> anyhow::Result<EncodingFlags> {
    if part.eq_ignore_ascii_case("ascii") {
        Ok(EncodingFlags::ASCII)
    } else if part.eq_ignore_ascii_case("utf8") {
        Ok(EncodingFlags::UTF8)
    } else if part.eq_ignore_ascii_case("unicode") {
        Ok(EncodingFlags::UNICODE)
    } else {
        anyhow::bail!("unknown encoding `{part}`, expected ASCII, UTF8, or Unicode")
    }
}

fn parse_memory_flags(s: &str) -> anyhow::Result<ReadMemoryFlags> {
    let mut flags = ReadMemoryFlags::empty();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let flag = if part.eq_ignore_ascii_case("stack") {
            ReadMemoryFlags::STACK
        } else if part.eq_ignore_ascii_case("heap") {
            ReadMemoryFlags::HEAP
        } else if part.eq_ignore_ascii_case("private") {
            ReadMemoryFlags::PRIVATE
        } else if part.eq_ignore_ascii_case("mappedfile") {
            ReadMemoryFlags::MAPPED_FILE
        } else if part.eq_ignore_ascii_case("shareable") {
            ReadMemoryFlags::SHAREABLE
        } else if part.eq_ignore_ascii_case("mapped") {
            ReadMemoryFlags::MAPPED
        } else if part.eq_ignore_ascii_case("image") {
            ReadMemoryFlags::IMAGE
        } else if part.eq_ignore_ascii_case("all") {
            ReadMemoryFlags::ALL
        } else {
            anyhow::bail!("unknown memory region kind `{part}`")
        };
        flags |= flag;
    }
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_encodings() {
        let flags = parse_encoding_flags("UTF8,Unicode").unwrap();
        assert!(flags.contains(EncodingFlags::UTF8));
        assert!(flags.contains(EncodingFlags::UNICODE));
        assert!(!flags.contains(EncodingFlags::ASCII));
    }

    #[test]
    fn rejects_unknown_encoding() {
        assert!(parse_encoding_flags("bogus").is_err());
    }

    #[test]
    fn parses_memory_region_aliases() {
        let flags = parse_memory_flags("Stack,Image").unwrap();
        assert!(flags.contains(ReadMemoryFlags::STACK));
        assert!(flags.contains(ReadMemoryFlags::IMAGE));
        assert!(!flags.contains(ReadMemoryFlags::HEAP));
    }
}
