//! Post-decode string filtering: regex or shell-style wildcard.

use regex::{Regex, RegexBuilder};

use crate::error::EngineError;

/// Case/culture options shared by both filter kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions {
    pub case_insensitive: bool,
    pub multi_line: bool,
}

pub enum Filter {
    Regex(Regex),
    Wildcard(WildcardMatcher),
}

impl Filter {
    pub fn regex(pattern: &str, options: FilterOptions) -> std::result::Result<Self, EngineError> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(options.case_insensitive)
            .multi_line(options.multi_line)
            .build()
            .map_err(|e| EngineError::InvalidFilterPattern(e.to_string()))?;
        Ok(Filter::Regex(compiled))
    }

    pub fn wildcard(pattern: &str, options: FilterOptions) -> std::result::Result<Self, EngineError> {
        Ok(Filter::Wildcard(WildcardMatcher::compile(pattern, options)?))
    }

    pub fn is_match(&self, s: &str) -> bool {
        match self {
            Filter::Regex(re) => re.is_match(s),
            Filter::Wildcard(w) => w.is_match(s),
        }
    }
}

/// One compiled wildcard pattern position: either a literal character to
/// match or one of the wildcard operators.
#[derive(Debug, Clone)]
enum Position {
    Literal(char),
    AnyOne,
    AnyRun,
    Set { negate: bool, entries: Vec<SetEntry> },
}

#[derive(Debug, Clone)]
enum SetEntry {
    Char(char),
    Range(char, char),
}

impl Position {
    fn matches(&self, c: char, case_insensitive: bool) -> bool {
        let eq = |a: char, b: char| if case_insensitive { a.eq_ignore_ascii_case(&b) } else { a == b };
        match self {
            Position::Literal(l) => eq(*l, c),
            Position::AnyOne => true,
            Position::AnyRun => true,
            Position::Set { negate, entries } => {
                let hit = entries.iter().any(|e| match e {
                    SetEntry::Char(ch) => eq(*ch, c),
                    SetEntry::Range(lo, hi) => {
                        let (c, lo, hi) = if case_insensitive {
                            (c.to_ascii_lowercase(), lo.to_ascii_lowercase(), hi.to_ascii_lowercase())
                        } else {
                            (c, *lo, *hi)
                        };
                        lo <= c && c <= hi
                    }
                });
                hit != *negate
            }
        }
    }
}

/// Wildcard patterns compile to a flat sequence of `Position`s, each either
/// a literal, `?`, `*`, or a `[...]` set; matching advances two cursors
/// (current pattern position, next pattern position) NFA-style rather than
/// recursing, so `*` never causes exponential backtracking.
#[derive(Debug, Clone)]
pub struct WildcardMatcher {
    positions: Vec<Position>,
    case_insensitive: bool,
}

impl WildcardMatcher {
    pub fn compile(pattern: &str, options: FilterOptions) -> std::result::Result<Self, EngineError> {
        let mut positions = Vec::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '`' => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| EngineError::InvalidFilterPattern("trailing backtick escape".into()))?;
                    positions.push(Position::Literal(escaped));
                }
                '*' => positions.push(Position::AnyRun),
                '?' => positions.push(Position::AnyOne),
                '[' => positions.push(Self::compile_set(&mut chars)?),
                other => positions.push(Position::Literal(other)),
            }
        }

        Ok(Self { positions, case_insensitive: options.case_insensitive })
    }

    fn compile_set(chars: &mut std::iter::Peekable<std::str::Chars>) -> std::result::Result<Position, EngineError> {
        let negate = matches!(chars.peek(), Some('!') | Some('^'));
        if negate {
            chars.next();
        }
        let mut entries = Vec::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            if c == ']' {
                closed = true;
                break;
            }
            let lo = if c == '`' {
                chars.next().ok_or_else(|| EngineError::InvalidFilterPattern("trailing backtick in set".into()))?
            } else {
                c
            };
            if chars.peek() == Some(&'-') {
                let mut lookahead = chars.clone();
                lookahead.next();
                if let Some(&hi_raw) = lookahead.peek() {
                    if hi_raw != ']' {
                        chars.next(); // consume '-'
                        let hi = chars.next().unwrap();
                        entries.push(SetEntry::Range(lo, hi));
                        continue;
                    }
                }
            }
            entries.push(SetEntry::Char(lo));
        }
        if !closed {
            return Err(EngineError::InvalidFilterPattern("unterminated [ set".into()));
        }
        Ok(Position::Set { negate, entries })
    }

    pub fn is_match(&self, s: &str) -> bool {
        let input: Vec<char> = s.chars().collect();
        self.matches_from(0, 0, &input)
    }

    /// NFA-style step: at most two candidate (pattern, input) states are
    /// live at once (the current position and, for `*`, the option of
    /// staying on `*` while consuming one more input character).
    fn matches_from(&self, mut pi: usize, mut ii: usize, input: &[char]) -> bool {
        let mut star_pi: Option<usize> = None;
        let mut star_ii = 0usize;

        loop {
            if pi == self.positions.len() {
                return ii == input.len();
            }
            let advances_on_star = matches!(self.positions[pi], Position::AnyRun);
            if advances_on_star {
                star_pi = Some(pi);
                star_ii = ii;
                pi += 1;
                continue;
            }

            let matched = ii < input.len() && self.positions[pi].matches(input[ii], self.case_insensitive);
            if matched {
                pi += 1;
                ii += 1;
                continue;
            }

            if let Some(sp) = star_pi {
                star_ii += 1;
                ii = star_ii;
                pi = sp + 1;
                if ii > input.len() {
                    return false;
                }
                continue;
            }

            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_f_regex_filter() {
        let f = Filter::regex("^H.*d$", FilterOptions::default()).unwrap();
        assert!(f.is_match("Hello World"));

        let f2 = Filter::regex("^world$", FilterOptions::default()).unwrap();
        assert!(!f2.is_match("Hello World"));
    }

    #[test]
    fn wildcard_star_and_question() {
        let f = Filter::wildcard("H?llo*", FilterOptions::default()).unwrap();
        assert!(f.is_match("Hello World"));
        assert!(f.is_match("Hallo"));
        assert!(!f.is_match("Hllo"));
    }

    #[test]
    fn wildcard_set_and_range() {
        let f = Filter::wildcard("[a-c]at", FilterOptions::default()).unwrap();
        assert!(f.is_match("cat"));
        assert!(f.is_match("bat"));
        assert!(!f.is_match("rat"));

        let neg = Filter::wildcard("[!a-c]at", FilterOptions::default()).unwrap();
        assert!(neg.is_match("rat"));
        assert!(!neg.is_match("cat"));
    }

    #[test]
    fn wildcard_backtick_escape() {
        let f = Filter::wildcard("100`%", FilterOptions::default()).unwrap();
        assert!(f.is_match("100%"));
        assert!(!f.is_match("100x"));
    }

    #[test]
    fn wildcard_case_insensitive() {
        let f = Filter::wildcard("hello", FilterOptions { case_insensitive: true, multi_line: false }).unwrap();
        assert!(f.is_match("HELLO"));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(Filter::regex("(unclosed", FilterOptions::default()).is_err());
    }
}
