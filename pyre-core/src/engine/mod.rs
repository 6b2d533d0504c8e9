//! Compiled patterns and the search interface
//!
//! An [`Engine`] wraps a pattern compiled by one of the two backends. The
//! search itself goes through an [`Input`], built once per haystack, which
//! owns the scratch space of the search and translates positions between
//! the caller's haystack and the one the backend sees.

pub mod fallback;
pub mod offsets;
pub mod primary;

use std::collections::HashMap;
use std::fmt;

use crate::config::CompileOptions;
use crate::error::{RegexError, Result};
use crate::flags::Flags;
use crate::parser::Pattern;
use crate::transpiler::{Backend, Translation, primary_supports, translate};

pub use fallback::FallbackEngine;
pub use primary::PrimaryEngine;

/// Spans of one match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    /// The start position of the match
    pub start: usize,
    /// The end position of the match (exclusive)
    pub end: usize,
    /// Span per group number, group 0 included; `None` when the group did
    /// not participate
    pub groups: Vec<Option<(usize, usize)>>,
}

impl Match {
    /// Clear every span and make room for `groups` groups
    pub fn reset(&mut self, groups: usize) {
        self.start = 0;
        self.end = 0;
        self.groups.clear();
        self.groups.resize(groups, None);
    }

    /// Record the span of a group
    pub fn set(&mut self, gid: usize, span: Option<(usize, usize)>) {
        if gid == 0 {
            if let Some((start, end)) = span {
                self.start = start;
                self.end = end;
            }
        }
        if let Some(slot) = self.groups.get_mut(gid) {
            *slot = span;
        }
    }

    /// Span of the whole match
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Whether the match is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Get a group span by number
    pub fn group(&self, n: usize) -> Option<(usize, usize)> {
        self.groups.get(n).copied().flatten()
    }

    /// Get the text of a group
    pub fn group_bytes<'t>(&self, text: &'t [u8], n: usize) -> Option<&'t [u8]> {
        self.group(n).and_then(|(start, end)| text.get(start..end))
    }

    /// Flat offset pairs, `-1, -1` for groups that did not participate
    pub fn offsets(&self) -> Vec<isize> {
        self.groups
            .iter()
            .flat_map(|span| match span {
                Some((start, end)) => [*start as isize, *end as isize],
                None => [-1, -1],
            })
            .collect()
    }
}

/// Metadata shared by both backends
#[derive(Debug, Clone)]
pub struct PatternInfo {
    /// Resolved global flags
    pub flags: Flags,
    /// Whether the pattern is a text pattern
    pub text_mode: bool,
    /// Group names by number, empty for unnamed groups and group 0
    pub names: Vec<String>,
    index: HashMap<String, usize>,
    /// The backend the pattern was compiled for
    pub backend: Backend,
    /// Pattern text handed to the backend
    pub native: String,
    /// Tree dump, kept when the DEBUG flag is set
    pub dump: Option<String>,
}

impl PatternInfo {
    pub fn new(pattern: &Pattern, translation: &Translation) -> Self {
        PatternInfo {
            flags: pattern.flags(),
            text_mode: pattern.text_mode,
            names: pattern.state.group_names(),
            index: pattern.state.names().clone(),
            backend: translation.backend,
            native: translation.pattern.clone(),
            dump: pattern
                .flags()
                .contains(Flags::DEBUG)
                .then(|| pattern.dump()),
        }
    }
}

/// A compiled pattern.
///
/// Engines are immutable once built; concurrent searches each build their
/// own [`Input`].
pub trait Engine: fmt::Debug + Send + Sync {
    /// Metadata of the compiled pattern
    fn info(&self) -> &PatternInfo;

    /// Whether [`Input::find`] honors `longest`
    fn supports_longest(&self) -> bool;

    /// Prepare `text[..endpos]` for searching
    fn build_input<'h>(&'h self, text: &'h [u8], endpos: usize) -> Box<dyn Input + 'h>;

    fn flags(&self) -> Flags {
        self.info().flags
    }

    fn text_mode(&self) -> bool {
        self.info().text_mode
    }

    /// Group names by number, group 0 included
    fn subexp_names(&self) -> &[String] {
        &self.info().names
    }

    /// Number of capture groups, group 0 excluded
    fn subexp_count(&self) -> usize {
        self.info().names.len().saturating_sub(1)
    }

    /// Group number of a named group
    fn subexp_index(&self, name: &str) -> Option<usize> {
        self.info().index.get(name).copied()
    }

    fn backend(&self) -> Backend {
        self.info().backend
    }

    /// The pattern text the backend compiled
    fn native_pattern(&self) -> &str {
        &self.info().native
    }

    /// The tree dump of a pattern compiled with [`Flags::DEBUG`]
    fn debug_dump(&self) -> Option<&str> {
        self.info().dump.as_deref()
    }
}

/// A haystack prepared for one engine
pub trait Input {
    /// Search for the leftmost match starting at or after `pos`.
    ///
    /// With `longest`, the longest match at the leftmost start is reported
    /// instead of the first one found in priority order. On success the
    /// spans are written into `m` and `true` is returned.
    ///
    /// # Errors
    /// Returns a runtime error if the backend gives up on the search.
    fn find(&mut self, pos: usize, longest: bool, m: &mut Match) -> Result<bool>;
}

/// Translate a parsed pattern and compile it with the selected backend
///
/// # Errors
/// Returns a compile error if the pattern needs the fallback backend and
/// `options` forbid it, or if the backend rejects the translated pattern.
pub fn build(pattern: &Pattern, options: &CompileOptions) -> Result<Box<dyn Engine>> {
    if !options.allows_fallback() && !primary_supports(pattern) {
        return Err(RegexError::Compile("regex has unsupported elements".to_string()));
    }
    let translation = translate(pattern, options.allows_fallback());
    let info = PatternInfo::new(pattern, &translation);
    Ok(match translation.backend {
        Backend::Primary => Box::new(PrimaryEngine::new(info, options)?),
        Backend::Fallback => Box::new(FallbackEngine::new(
            info,
            &translation.synthetic_names,
            options,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    fn first(pattern: &str, text: &str) -> Option<Match> {
        let engine = compile(pattern.as_bytes(), true, Flags::empty(), true).unwrap();
        let mut input = engine.build_input(text.as_bytes(), text.len());
        let mut m = Match::default();
        input.find(0, false, &mut m).unwrap().then_some(m)
    }

    #[test]
    fn test_match_offsets() {
        let mut m = Match::default();
        m.reset(3);
        m.set(0, Some((1, 4)));
        m.set(2, Some((2, 3)));
        assert_eq!(m.span(), (1, 4));
        assert_eq!(m.offsets(), vec![1, 4, -1, -1, 2, 3]);
        assert_eq!(m.group_bytes(b"xabcx", 2), Some(&b"b"[..]));
        assert_eq!(m.group(1), None);
    }

    #[test]
    fn test_metadata() {
        let engine = compile(b"(?P<first>a)(b)(?P<third>c)", true, Flags::empty(), true).unwrap();
        assert_eq!(engine.subexp_count(), 3);
        assert_eq!(engine.subexp_names(), ["", "first", "", "third"]);
        assert_eq!(engine.subexp_index("third"), Some(3));
        assert_eq!(engine.subexp_index("missing"), None);
        assert!(engine.flags().contains(Flags::UNICODE));
        assert_eq!(engine.debug_dump(), None);
    }

    #[test]
    fn test_groups_keep_their_numbers_on_both_backends() {
        for pattern in ["(a)(b)?(c)", "(a)(b)?(c)(?=)"] {
            let m = first(pattern, "xac").unwrap();
            assert_eq!(m.offsets(), vec![1, 3, 1, 2, -1, -1, 2, 3], "{}", pattern);
        }
    }

    #[test]
    fn test_unsupported_without_fallback() {
        for pattern in ["a$", "a{1001}", "(a)\\1", "(?=a)"] {
            let err = compile(pattern.as_bytes(), true, Flags::empty(), false).unwrap_err();
            assert_eq!(err.to_string(), "regex has unsupported elements", "{}", pattern);
        }
        let err = compile("(?P<caf\u{e9}>a)".as_bytes(), true, Flags::empty(), false).unwrap_err();
        assert!(matches!(err, RegexError::Compile(_)));

        let engine = compile(b"(?m)a$", true, Flags::empty(), false).unwrap();
        assert_eq!(engine.backend(), Backend::Primary);
    }

    #[test]
    fn test_debug_dump() {
        let engine = compile(b"a", true, Flags::DEBUG, true).unwrap();
        assert_eq!(engine.debug_dump(), Some("LITERAL 97"));
    }
}
