//! The linear-time backend, built on `regex-automata`
//!
//! Text patterns run in Unicode mode over a haystack repaired to valid
//! UTF-8. Bytes patterns run with Unicode disabled over the raw haystack.
//! A second regex compiled with [`MatchKind::All`] answers longest-match
//! searches.

use std::borrow::Cow;

use regex_automata::util::captures::Captures;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input as Haystack, MatchKind, meta};

use super::offsets::Normalized;
use super::{Engine, Input, Match, PatternInfo};
use crate::config::CompileOptions;
use crate::error::{RegexError, Result};

/// A pattern compiled for the primary backend
#[derive(Debug)]
pub struct PrimaryEngine {
    info: PatternInfo,
    regex: meta::Regex,
    longest: meta::Regex,
}

impl PrimaryEngine {
    /// Compile the translated pattern held by `info`
    ///
    /// # Errors
    /// Returns a compile error if `regex-automata` rejects the pattern or
    /// reports a different number of groups than the parser found.
    pub fn new(info: PatternInfo, options: &CompileOptions) -> Result<Self> {
        let regex = build_regex(&info, MatchKind::LeftmostFirst, options)?;
        let longest = build_regex(&info, MatchKind::All, options)?;

        if regex.captures_len() != info.names.len() {
            return Err(RegexError::Compile(format!(
                "expected {} groups, backend reported {}",
                info.names.len(),
                regex.captures_len()
            )));
        }

        Ok(PrimaryEngine {
            info,
            regex,
            longest,
        })
    }
}

fn build_regex(info: &PatternInfo, kind: MatchKind, options: &CompileOptions) -> Result<meta::Regex> {
    meta::Regex::builder()
        .syntax(syntax::Config::new().unicode(info.text_mode).utf8(false))
        .configure(
            meta::Config::new()
                .match_kind(kind)
                .utf8_empty(info.text_mode)
                .nfa_size_limit(Some(options.get_size_limit()))
                .hybrid_cache_capacity(options.get_dfa_size_limit()),
        )
        .build(&info.native)
        .map_err(|err| RegexError::Compile(err.to_string()))
}

impl Engine for PrimaryEngine {
    fn info(&self) -> &PatternInfo {
        &self.info
    }

    fn supports_longest(&self) -> bool {
        true
    }

    fn build_input<'h>(&'h self, text: &'h [u8], endpos: usize) -> Box<dyn Input + 'h> {
        let text = &text[..endpos.min(text.len())];
        let (haystack, offsets) = if self.info.text_mode {
            Normalized::repair_utf8(text).into_bytes()
        } else {
            (Cow::Borrowed(text), Normalized::identity())
        };
        Box::new(PrimaryInput {
            engine: self,
            haystack,
            offsets,
            caps: self.regex.create_captures(),
            longest_caps: self.longest.create_captures(),
        })
    }
}

struct PrimaryInput<'h> {
    engine: &'h PrimaryEngine,
    haystack: Cow<'h, [u8]>,
    offsets: Normalized<'static>,
    caps: Captures,
    longest_caps: Captures,
}

impl Input for PrimaryInput<'_> {
    fn find(&mut self, pos: usize, longest: bool, m: &mut Match) -> Result<bool> {
        let start = self.offsets.to_norm(pos);
        if start > self.haystack.len() {
            return Ok(false);
        }

        let input = Haystack::new(&*self.haystack).range(start..);
        self.engine.regex.search_captures(&input, &mut self.caps);
        let Some(found) = self.caps.get_match() else {
            return Ok(false);
        };

        // the leftmost start is the same under both match kinds
        let use_longest = longest && {
            let anchored = input.clone().range(found.start()..).anchored(Anchored::Yes);
            self.engine
                .longest
                .search_captures(&anchored, &mut self.longest_caps);
            self.longest_caps.is_match()
        };
        let caps = if use_longest {
            &self.longest_caps
        } else {
            &self.caps
        };

        m.reset(caps.group_len());
        for gid in 0..caps.group_len() {
            let span = caps
                .get_group(gid)
                .map(|span| (self.offsets.to_orig(span.start), self.offsets.to_orig(span.end)));
            m.set(gid, span);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use crate::flags::Flags;
    use crate::transpiler::Backend;

    fn find_at(pattern: &[u8], text_mode: bool, text: &[u8], pos: usize, longest: bool) -> Option<(usize, usize)> {
        let engine = compile(pattern, text_mode, Flags::empty(), false).unwrap();
        assert_eq!(engine.backend(), Backend::Primary);
        let mut input = engine.build_input(text, text.len());
        let mut m = Match::default();
        input.find(pos, longest, &mut m).unwrap().then(|| m.span())
    }

    #[test]
    fn test_leftmost_first() {
        assert_eq!(find_at(b"a|ab", true, b"xab", 0, false), Some((1, 2)));
        assert_eq!(find_at(b"a|ab", true, b"xab", 0, true), Some((1, 3)));
    }

    #[test]
    fn test_search_from_position() {
        assert_eq!(find_at(b"a", true, b"aaa", 1, false), Some((1, 2)));
        assert_eq!(find_at(b"^a", true, b"aaa", 1, false), None);
        assert_eq!(find_at(b"a", true, b"aaa", 3, false), None);
        assert_eq!(find_at(b"", true, b"aaa", 3, false), Some((3, 3)));
    }

    #[test]
    fn test_invalid_utf8_offsets() {
        assert_eq!(find_at(b"b", true, b"a\xffb", 0, false), Some((2, 3)));
        assert_eq!(find_at(b"\\xff", true, b"a\xffb", 0, false), Some((1, 2)));
        assert_eq!(find_at(b".b", true, b"\xc3\xa9\xffb", 0, false), Some((2, 4)));
    }

    #[test]
    fn test_bytes_mode() {
        assert_eq!(find_at(b"\xe9", false, b"caf\xe9", 0, false), Some((3, 4)));
        assert_eq!(find_at(b"\\w+", false, b"caf\xc3\xa9", 0, false), Some((0, 3)));
        assert_eq!(find_at(b".", false, b"\xff", 0, false), Some((0, 1)));
    }

    #[test]
    fn test_unicode_categories() {
        assert_eq!(find_at(b"\\d+", true, "x\u{663}4".as_bytes(), 0, false), Some((1, 4)));
        assert_eq!(find_at(b"(?a)\\d+", true, "x\u{663}4".as_bytes(), 0, false), Some((3, 4)));
    }

    #[test]
    fn test_endpos() {
        let engine = compile(b"c$", true, Flags::MULTILINE, false).unwrap();
        let mut input = engine.build_input(b"abcd", 3);
        let mut m = Match::default();
        assert!(input.find(0, false, &mut m).unwrap());
        assert_eq!(m.span(), (2, 3));
    }
}
