//! Character printability and Unicode-block classification.
//!
//! Two tables drive the innermost decoder loop: byte-indexed printability
//! (`is_printable`) and code-point-indexed block membership (`block_of`).
//! Both are meant to be O(1)/branch-light; `block_of` is backed by a sorted
//! range table searched with `partition_point` rather than a literal
//! 65,536-entry array, since the array would be machine-generated data that
//! has no place hand-written in source.

use std::fmt;
use std::str::FromStr;

/// Sentinel block id: the code point is not covered by any supported block.
pub const UNASSIGNED: u8 = 0xFF;

/// Block id for `BasicLatin`. Always implicitly part of any non-empty
/// `UnicodeBlockSet` (see `UnicodeBlockSet::new`).
pub const BASIC_LATIN: u8 = 0;

/// Block id for the `LatinExtensions` aggregate (see module docs on the
/// seven ranges it covers).
pub const LATIN_EXTENSIONS: u8 = 1;

/// `printable_ascii[byte] == true` iff `byte` is a printable 7-bit ASCII
/// character, control characters included (HT, LF, CR, and the other C0/C1
/// codes are not printable; DEL is not printable; space and above are).
pub static PRINTABLE_ASCII: [bool; 256] = build_printable_ascii(false);

/// Same as `PRINTABLE_ASCII` but additionally excludes HT (0x09), LF (0x0A)
/// and CR (0x0D).
pub static PRINTABLE_ASCII_NO_CONTROL: [bool; 256] = build_printable_ascii(true);

const fn build_printable_ascii(exclude_control: bool) -> [bool; 256] {
    let mut table = [false; 256];
    let mut b: usize = 0;
    while b < 256 {
        let printable = match b as u8 {
            0x09 | 0x0A | 0x0D => !exclude_control,
            0x20..=0x7E => true,
            _ => false,
        };
        table[b] = printable;
        b += 1;
    }
    table
}

/// Is `byte` printable? `exclude_control` additionally excludes HT/LF/CR.
#[inline]
pub fn is_printable(byte: u8, exclude_control: bool) -> bool {
    if exclude_control {
        PRINTABLE_ASCII_NO_CONTROL[byte as usize]
    } else {
        PRINTABLE_ASCII[byte as usize]
    }
}

/// One contiguous `[start, end]` run of BMP code points mapped to one block
/// id. Several ranges may share the same id (the `LatinExtensions` and
/// `Arabic` aggregates do), which is how aggregation is expressed here.
struct BlockRange {
    start: u32,
    end: u32,
    id: u8,
    name: &'static str,
}

/// Canonical block table. Ordered by `start`; `block_of` binary-searches it.
/// This is a representative subset of the ~105 blocks a fully generated
/// table would carry, chosen to cover the blocks exercised by the scanner's
/// own aggregation rules and tests.
const BLOCKS: &[BlockRange] = &[
    BlockRange { start: 0x0000, end: 0x007F, id: BASIC_LATIN, name: "BasicLatin" },
    BlockRange { start: 0x0080, end: 0x00FF, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x0100, end: 0x017F, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x0180, end: 0x024F, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x0250, end: 0x02AF, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x02B0, end: 0x02FF, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x0300, end: 0x036F, id: 2, name: "CombiningDiacriticals" },
    BlockRange { start: 0x0370, end: 0x03FF, id: 3, name: "Greek" },
    BlockRange { start: 0x0400, end: 0x04FF, id: 4, name: "Cyrillic" },
    BlockRange { start: 0x0500, end: 0x052F, id: 4, name: "Cyrillic" },
    BlockRange { start: 0x0530, end: 0x058F, id: 5, name: "Armenian" },
    BlockRange { start: 0x0590, end: 0x05FF, id: 6, name: "Hebrew" },
    BlockRange { start: 0x0600, end: 0x06FF, id: 7, name: "Arabic" },
    BlockRange { start: 0x0700, end: 0x074F, id: 7, name: "Arabic" },
    BlockRange { start: 0x0750, end: 0x077F, id: 7, name: "Arabic" },
    BlockRange { start: 0x0780, end: 0x07BF, id: 7, name: "Arabic" },
    BlockRange { start: 0x07C0, end: 0x07FF, id: 7, name: "Arabic" },
    BlockRange { start: 0x08A0, end: 0x08FF, id: 7, name: "Arabic" },
    BlockRange { start: 0x0900, end: 0x097F, id: 8, name: "Devanagari" },
    BlockRange { start: 0x0980, end: 0x09FF, id: 9, name: "Bengali" },
    BlockRange { start: 0x0A80, end: 0x0AFF, id: 10, name: "Gujarati" },
    BlockRange { start: 0x0E00, end: 0x0E7F, id: 11, name: "Thai" },
    BlockRange { start: 0x0E80, end: 0x0EFF, id: 12, name: "Lao" },
    BlockRange { start: 0x0F00, end: 0x0FFF, id: 13, name: "Tibetan" },
    BlockRange { start: 0x1000, end: 0x109F, id: 14, name: "Myanmar" },
    BlockRange { start: 0x10A0, end: 0x10FF, id: 15, name: "Georgian" },
    BlockRange { start: 0x1100, end: 0x11FF, id: 16, name: "Hangul" },
    BlockRange { start: 0x1200, end: 0x137F, id: 17, name: "Ethiopic" },
    BlockRange { start: 0x13A0, end: 0x13FF, id: 18, name: "Cherokee" },
    BlockRange { start: 0x1680, end: 0x169F, id: 19, name: "Ogham" },
    BlockRange { start: 0x16A0, end: 0x16FF, id: 20, name: "Runic" },
    BlockRange { start: 0x1780, end: 0x17FF, id: 21, name: "Khmer" },
    BlockRange { start: 0x1800, end: 0x18AF, id: 22, name: "Mongolian" },
    BlockRange { start: 0x1E00, end: 0x1EFF, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x1F00, end: 0x1FFF, id: 3, name: "Greek" },
    BlockRange { start: 0x2000, end: 0x206F, id: 23, name: "GeneralPunctuation" },
    BlockRange { start: 0x20A0, end: 0x20CF, id: 24, name: "CurrencySymbols" },
    BlockRange { start: 0x2100, end: 0x214F, id: 25, name: "LetterlikeSymbols" },
    BlockRange { start: 0x2150, end: 0x218F, id: 26, name: "NumberForms" },
    BlockRange { start: 0x2190, end: 0x21FF, id: 27, name: "Arrows" },
    BlockRange { start: 0x2200, end: 0x22FF, id: 28, name: "MathematicalOperators" },
    BlockRange { start: 0x2500, end: 0x257F, id: 29, name: "BoxDrawing" },
    BlockRange { start: 0x2580, end: 0x259F, id: 30, name: "BlockElements" },
    BlockRange { start: 0x25A0, end: 0x25FF, id: 31, name: "GeometricShapes" },
    BlockRange { start: 0x2600, end: 0x26FF, id: 32, name: "Miscellaneous" },
    BlockRange { start: 0x2700, end: 0x27BF, id: 33, name: "Dingbats" },
    BlockRange { start: 0x2C60, end: 0x2C7F, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x2E80, end: 0x2EFF, id: 34, name: "Cjk" },
    BlockRange { start: 0x3000, end: 0x303F, id: 23, name: "GeneralPunctuation" },
    BlockRange { start: 0x3040, end: 0x309F, id: 35, name: "Hiragana" },
    BlockRange { start: 0x30A0, end: 0x30FF, id: 36, name: "Katakana" },
    BlockRange { start: 0x3400, end: 0x4DBF, id: 34, name: "Cjk" },
    BlockRange { start: 0x4E00, end: 0x9FFF, id: 34, name: "Cjk" },
    BlockRange { start: 0xA000, end: 0xA4CF, id: 37, name: "YiSyllables" },
    BlockRange { start: 0xAC00, end: 0xD7AF, id: 16, name: "Hangul" },
    BlockRange { start: 0xE000, end: 0xF8FF, id: 38, name: "PrivateUseArea" },
    BlockRange { start: 0xF900, end: 0xFAFF, id: 34, name: "Cjk" },
    BlockRange { start: 0xFB00, end: 0xFB4F, id: LATIN_EXTENSIONS, name: "LatinExtensions" },
    BlockRange { start: 0x28000, end: 0x2828F, id: 39, name: "BraillePatterns" },
];

/// Every canonical block name, for `UnicodeBlockSet::parse`/`to_string` and
/// for CLI help text. `id` may repeat (aggregation); `All` is not listed
/// here, it is the dedicated sentinel handled by `UnicodeBlockSet`.
pub fn canonical_names() -> impl Iterator<Item = (&'static str, u8)> {
    let mut seen = [false; 64];
    BLOCKS.iter().filter_map(move |r| {
        if seen[r.id as usize] {
            None
        } else {
            seen[r.id as usize] = true;
            Some((r.name, r.id))
        }
    })
}

/// Map a BMP code point to its block id, or `UNASSIGNED` if none of the
/// supported blocks cover it.
#[inline]
pub fn block_of(codepoint: u16) -> u8 {
    let cp = codepoint as u32;
    let idx = BLOCKS.partition_point(|r| r.end < cp);
    match BLOCKS.get(idx) {
        Some(r) if r.start <= cp && cp <= r.end => r.id,
        _ => UNASSIGNED,
    }
}

/// Are blocks `a` and `b` allowed to coexist within one decoded run? Always
/// true for identical blocks; `BasicLatin`/`LatinExtensions` additionally
/// mix (so a single accented character doesn't split an otherwise-Western
/// string).
#[inline]
pub fn blocks_compatible(a: u8, b: u8) -> bool {
    if a == b {
        return true;
    }
    let pair = (a == BASIC_LATIN && b == LATIN_EXTENSIONS) || (a == LATIN_EXTENSIONS && b == BASIC_LATIN);
    pair
}

/// A bitset over named Unicode blocks, plus the `All` sentinel. Represented
/// as two `u64`s (128 bits is enough for every block id this table uses)
/// rather than as an enum of named getters, keeping membership tests and
/// set arithmetic to plain bit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeBlockSet {
    lo: u64,
    hi: u64,
    /// When set, every id except `UNASSIGNED` matches, overriding `lo`/`hi`.
    all: bool,
}

impl UnicodeBlockSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self { lo: 0, hi: 0, all: false }
    }

    /// The sentinel set that matches every assigned block.
    pub fn all() -> Self {
        Self { lo: 0, hi: 0, all: true }
    }

    /// Build a set from explicit ids, implicitly adding `BasicLatin` when
    /// the result would otherwise be non-empty.
    pub fn from_ids<I: IntoIterator<Item = u8>>(ids: I) -> Self {
        let mut set = Self::empty();
        for id in ids {
            set.insert(id);
        }
        if !set.is_empty() {
            set.insert(BASIC_LATIN);
        }
        set
    }

    fn insert(&mut self, id: u8) {
        if id < 64 {
            self.lo |= 1 << id;
        } else if id < 128 {
            self.hi |= 1 << (id - 64);
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.lo == 0 && self.hi == 0
    }

    /// Does this set admit `block_id`? `UNASSIGNED` never matches, even
    /// under `All`.
    #[inline]
    pub fn contains(&self, block_id: u8) -> bool {
        if block_id == UNASSIGNED {
            return false;
        }
        if self.all {
            return true;
        }
        if block_id < 64 {
            self.lo & (1 << block_id) != 0
        } else if block_id < 128 {
            self.hi & (1 << (block_id - 64)) != 0
        } else {
            false
        }
    }

    /// Parse one comma-separated block name into this set's bit, returning
    /// the id on success. Case-insensitive, matches `canonical_names()`.
    pub fn parse_block_name(name: &str) -> Option<u8> {
        if name.eq_ignore_ascii_case("all") {
            return None; // caller handles `All` as the dedicated sentinel
        }
        canonical_names()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, id)| id)
    }
}

impl FromStr for UnicodeBlockSet {
    type Err = String;

    /// Parses a comma-separated list of block names, e.g.
    /// `"BasicLatin,Cyrillic,Cjk"`, or the literal `"All"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::empty());
        }
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let mut ids = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match Self::parse_block_name(part) {
                Some(id) => ids.push(id),
                None if part.eq_ignore_ascii_case("all") => return Ok(Self::all()),
                None => return Err(format!("unknown Unicode block name `{part}`")),
            }
        }
        Ok(Self::from_ids(ids))
    }
}

impl fmt::Display for UnicodeBlockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all {
            return write!(f, "All");
        }
        let names: Vec<&str> = canonical_names()
            .filter(|(_, id)| self.contains(*id))
            .map(|(name, _)| name)
            .collect();
        write!(f, "{}", names.join(","))
    }
}

impl Default for UnicodeBlockSet {
    /// Default: `{BasicLatin}`.
    fn default() -> Self {
        Self::from_ids([BASIC_LATIN])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_printability() {
        assert!(is_printable(b'A', false));
        assert!(is_printable(b'\t', false));
        assert!(!is_printable(b'\t', true));
        assert!(!is_printable(0x00, false));
        assert!(!is_printable(0x7F, false));
        assert!(is_printable(b' ', true));
    }

    #[test]
    fn block_lookup() {
        assert_eq!(block_of('A' as u16), BASIC_LATIN);
        assert_eq!(block_of('é' as u16), LATIN_EXTENSIONS);
        assert_eq!(block_of('中' as u16), 34);
        assert_eq!(block_of(0x05D0), 6); // Hebrew aleph
        assert_eq!(block_of(0xFFFE), UNASSIGNED);
    }

    #[test]
    fn basic_latin_latin_extensions_compatible() {
        assert!(blocks_compatible(BASIC_LATIN, LATIN_EXTENSIONS));
        assert!(blocks_compatible(LATIN_EXTENSIONS, BASIC_LATIN));
        assert!(!blocks_compatible(BASIC_LATIN, 34));
    }

    #[test]
    fn block_set_always_includes_basic_latin() {
        let set = UnicodeBlockSet::from_ids([34]);
        assert!(set.contains(BASIC_LATIN));
        assert!(set.contains(34));
        assert!(!set.contains(6));
    }

    #[test]
    fn all_matches_everything_but_unassigned() {
        let set = UnicodeBlockSet::all();
        assert!(set.contains(BASIC_LATIN));
        assert!(set.contains(34));
        assert!(!set.contains(UNASSIGNED));
    }

    #[test]
    fn parse_and_display_round_trip() {
        let set: UnicodeBlockSet = "BasicLatin,Cjk".parse().unwrap();
        assert!(set.contains(BASIC_LATIN));
        assert!(set.contains(34));
        let s = set.to_string();
        let reparsed: UnicodeBlockSet = s.parse().unwrap();
        assert_eq!(set, reparsed);

        let all: UnicodeBlockSet = "All".parse().unwrap();
        assert_eq!(all.to_string(), "All");

        assert!("NotARealBlock".parse::<UnicodeBlockSet>().is_err());
    }

    #[test]
    fn empty_set_stays_empty() {
        let set: UnicodeBlockSet = "".parse().unwrap();
        assert!(set.is_empty());
        assert!(!set.contains(BASIC_LATIN));
    }
}
