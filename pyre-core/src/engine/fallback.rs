//! The backtracking backend, built on `fancy-regex`
//!
//! `fancy-regex` only searches `&str`, so text haystacks are repaired to
//! valid UTF-8 and bytes haystacks are widened byte by byte. Capture groups
//! are compiled under synthetic names and looked up through a slot table,
//! so group numbers always follow the source pattern.

use fancy_regex::RegexBuilder;

use super::offsets::Normalized;
use super::{Engine, Input, Match, PatternInfo};
use crate::config::CompileOptions;
use crate::error::{RegexError, Result};

/// A pattern compiled for the fallback backend
#[derive(Debug)]
pub struct FallbackEngine {
    info: PatternInfo,
    regex: fancy_regex::Regex,
    /// Capture slot in `regex` for each group number
    slots: Vec<usize>,
}

impl FallbackEngine {
    /// Compile the translated pattern held by `info`.
    ///
    /// `synthetic_names` pairs every synthetic group name with the group
    /// number it stands for.
    ///
    /// # Errors
    /// Returns a compile error if `fancy-regex` rejects the pattern or a
    /// group cannot be found again after compilation.
    pub fn new(
        info: PatternInfo,
        synthetic_names: &[(String, usize)],
        options: &CompileOptions,
    ) -> Result<Self> {
        let mut builder = RegexBuilder::new(&info.native);
        builder
            .backtrack_limit(options.get_backtrack_limit())
            .delegate_size_limit(options.get_size_limit())
            .delegate_dfa_size_limit(options.get_dfa_size_limit());
        let regex = builder
            .build()
            .map_err(|err| RegexError::Compile(err.to_string()))?;

        let mut slots = vec![None; info.names.len()];
        if let Some(whole) = slots.first_mut() {
            *whole = Some(0);
        }
        for (slot, name) in regex.capture_names().enumerate() {
            let Some(name) = name else { continue };
            if let Some(&(_, gid)) = synthetic_names.iter().find(|(synthetic, _)| synthetic == name) {
                if let Some(entry) = slots.get_mut(gid) {
                    *entry = Some(slot);
                }
            }
        }
        let slots = slots
            .into_iter()
            .enumerate()
            .map(|(gid, slot)| {
                slot.ok_or_else(|| RegexError::Compile(format!("lost capture group {}", gid)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FallbackEngine { info, regex, slots })
    }
}

impl Engine for FallbackEngine {
    fn info(&self) -> &PatternInfo {
        &self.info
    }

    fn supports_longest(&self) -> bool {
        false
    }

    fn build_input<'h>(&'h self, text: &'h [u8], endpos: usize) -> Box<dyn Input + 'h> {
        let text = &text[..endpos.min(text.len())];
        let haystack = if self.info.text_mode {
            Normalized::repair_utf8(text)
        } else {
            Normalized::widen_bytes(text)
        };
        Box::new(FallbackInput {
            engine: self,
            haystack,
        })
    }
}

struct FallbackInput<'h> {
    engine: &'h FallbackEngine,
    haystack: Normalized<'h>,
}

impl Input for FallbackInput<'_> {
    fn find(&mut self, pos: usize, _longest: bool, m: &mut Match) -> Result<bool> {
        let text = self.haystack.as_str();
        let start = self.haystack.to_norm(pos);
        if start > text.len() {
            return Ok(false);
        }
        let start = (start..text.len())
            .find(|&i| text.is_char_boundary(i))
            .unwrap_or(text.len());

        let caps = match self.engine.regex.captures_from_pos(text, start) {
            Ok(Some(caps)) => caps,
            Ok(None) => return Ok(false),
            Err(err) => return Err(RegexError::Runtime(err.to_string())),
        };

        m.reset(self.engine.slots.len());
        for (gid, &slot) in self.engine.slots.iter().enumerate() {
            let span = caps.get(slot).map(|group| {
                (
                    self.haystack.to_orig(group.start()),
                    self.haystack.to_orig(group.end()),
                )
            });
            m.set(gid, span);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use crate::config::CompileOptions;
    use crate::flags::Flags;
    use crate::transpiler::Backend;

    fn find_at(pattern: &[u8], text_mode: bool, text: &[u8], pos: usize) -> Option<Vec<isize>> {
        let engine = compile(pattern, text_mode, Flags::FALLBACK, true).unwrap();
        assert_eq!(engine.backend(), Backend::Fallback);
        let mut input = engine.build_input(text, text.len());
        let mut m = Match::default();
        input.find(pos, false, &mut m).unwrap().then(|| m.offsets())
    }

    #[test]
    fn test_backreference() {
        assert_eq!(find_at(b"(a)\\1", true, b"xaa", 0), Some(vec![1, 3, 1, 2]));
        assert_eq!(find_at(b"(a)\\1", true, b"xab", 0), None);
    }

    #[test]
    fn test_named_backreference() {
        assert_eq!(find_at(b"(?P<q>['\"])x(?P=q)", true, b"'x\"x\"", 0), Some(vec![2, 5, 2, 3]));
        assert_eq!(find_at(b"(a)(b)\\2\\1", true, b"abba", 0), Some(vec![0, 4, 0, 1, 1, 2]));
    }

    #[test]
    fn test_conditional() {
        assert_eq!(find_at(b"(a)?(?(1)b|c)", true, b"ab", 0), Some(vec![0, 2, 0, 1]));
        assert_eq!(find_at(b"(a)?(?(1)b|c)", true, b"c", 0), Some(vec![0, 1, -1, -1]));
        assert_eq!(find_at(b"(?P<x>a)?(?(x)b)$", true, b"b", 0), Some(vec![1, 1, -1, -1]));
    }

    #[test]
    fn test_lookaround_and_position() {
        assert_eq!(find_at(b"(?<=a)b", true, b"abab", 2), Some(vec![3, 4]));
        assert_eq!(find_at(b"^b", true, b"ab", 1), None);
    }

    #[test]
    fn test_group_numbers_survive() {
        assert_eq!(
            find_at(b"(?P<x>a)(b)?(?P<y>c)", true, b"ac", 0),
            Some(vec![0, 2, 0, 1, -1, -1, 1, 2])
        );
    }

    #[test]
    fn test_dollar_before_final_newline() {
        assert_eq!(find_at(b"a$", true, b"a\n", 0), Some(vec![0, 1]));
        assert_eq!(find_at(b"a$", true, b"a\nb", 0), None);
    }

    #[test]
    fn test_invalid_utf8_offsets() {
        assert_eq!(find_at(b"(?=b)", true, b"\xff\xfeb", 0), Some(vec![2, 2]));
        assert_eq!(find_at(b"\\xfe", true, b"\xff\xfeb", 0), Some(vec![1, 2]));
    }

    #[test]
    fn test_bytes_mode() {
        assert_eq!(find_at(b"(\\xc3)\\1", false, b"\xc3\xa9\xc3\xc3", 0), Some(vec![2, 4, 2, 3]));
        assert_eq!(find_at(b"(?i)\\bK", false, b"ak k", 0), Some(vec![3, 4]));
    }

    #[test]
    fn test_backtrack_limit() {
        let engine = CompileOptions::new()
            .backtrack_limit(100_000)
            .compile(b"(?i)(a|b|ab)*(?=c)", true, Flags::empty())
            .unwrap();
        let text = b"ab".repeat(28);
        let mut input = engine.build_input(&text, text.len());
        let err = input.find(0, false, &mut Match::default()).unwrap_err();
        assert!(matches!(err, RegexError::Runtime(_)));
    }
}
