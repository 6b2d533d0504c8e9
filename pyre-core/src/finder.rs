//! Iteration over non-overlapping matches
//!
//! The rules follow Python's `finditer`: an empty match is allowed right
//! after a previous match, the search always advances by at least one
//! character, and a match with the same span as the previous one is never
//! reported twice.
//!
//! The primary backend finds one match per position. When that match is
//! empty, the same position is searched again for the longest match, which
//! can reveal a non-empty match a leftmost-first search would miss.

use log::trace;

use crate::engine::{Engine, Input, Match};
use crate::error::Result;
use crate::source::decode_utf8;

/// Find a single match starting at or after `pos`
pub fn find_match(engine: &dyn Engine, text: &[u8], pos: usize, longest: bool) -> Result<Option<Match>> {
    let mut input = engine.build_input(text, text.len());
    let mut m = Match::default();
    Ok(input.find(pos, longest, &mut m)?.then_some(m))
}

/// Find up to `limit` matches from `pos` and hand each one to `deliver`.
///
/// A `limit` of 0 means no limit.
pub fn find_matches<F>(engine: &dyn Engine, text: &[u8], pos: usize, limit: usize, mut deliver: F) -> Result<()>
where
    F: FnMut(&Match) -> Result<()>,
{
    for m in Finder::new(engine, text, pos).limit(limit) {
        deliver(&m?)?;
    }
    Ok(())
}

/// Split `text` around up to `maxsplit` matches (0 for all).
///
/// Each match contributes the text before it followed by the text of every
/// capture group, `None` for groups that did not participate. The text
/// after the last match comes last.
pub fn split<'t>(engine: &dyn Engine, text: &'t [u8], maxsplit: usize) -> Result<Vec<Option<&'t [u8]>>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in Finder::new(engine, text, 0).limit(maxsplit) {
        let m = m?;
        pieces.push(Some(&text[last..m.start]));
        pieces.extend((1..m.groups.len()).map(|gid| m.group_bytes(text, gid)));
        last = m.end;
    }
    pieces.push(Some(&text[last..]));
    Ok(pieces)
}

/// Iterator over the matches of an engine in a haystack
pub struct Finder<'a> {
    input: Box<dyn Input + 'a>,
    text: &'a [u8],
    text_mode: bool,
    supports_longest: bool,
    pos: usize,
    end: usize,
    limit: Option<usize>,
    found: usize,
    last: Option<(usize, usize)>,
    first_pass: bool,
}

impl<'a> Finder<'a> {
    /// Iterate over every match of `engine` in `text`, starting at `pos`
    pub fn new(engine: &'a dyn Engine, text: &'a [u8], pos: usize) -> Self {
        Finder::with_endpos(engine, text, pos, text.len())
    }

    /// Like [`Finder::new`], but only `text[..endpos]` is searched
    pub fn with_endpos(engine: &'a dyn Engine, text: &'a [u8], pos: usize, endpos: usize) -> Self {
        let text = &text[..endpos.min(text.len())];
        Finder {
            input: engine.build_input(text, text.len()),
            text,
            text_mode: engine.text_mode(),
            supports_longest: engine.supports_longest(),
            pos,
            end: text.len(),
            limit: None,
            found: 0,
            last: None,
            first_pass: true,
        }
    }

    /// Stop after `limit` matches; 0 means no limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Width of the character at `pos`; 1 for bytes, invalid UTF-8 and the
    /// end of the haystack
    fn width_at(&self, pos: usize) -> usize {
        if !self.text_mode {
            return 1;
        }
        self.text
            .get(pos..)
            .and_then(decode_utf8)
            .map_or(1, |(_, width)| width)
    }

    fn stop(&mut self) {
        self.pos = self.end + 1;
    }
}

impl Iterator for Finder<'_> {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.limit.is_none_or(|limit| self.found < limit) && self.pos <= self.end {
            let mut m = Match::default();
            match self.input.find(self.pos, !self.first_pass, &mut m) {
                Ok(true) => {}
                Ok(false) => {
                    self.stop();
                    return None;
                }
                Err(err) => {
                    self.stop();
                    return Some(Err(err));
                }
            }

            let (start, end) = m.span();
            trace!(
                "pos {} pass {}: match {}..{}",
                self.pos,
                if self.first_pass { 1 } else { 2 },
                start,
                end
            );
            let fresh = self.last != Some((start, end));
            if fresh {
                self.last = Some((start, end));
                self.found += 1;
            }

            if self.first_pass && self.supports_longest && start == end {
                // search the same position again for the longest match
                self.first_pass = false;
            } else {
                self.first_pass = true;
                let width = self.width_at(self.pos);
                self.pos = if self.pos + width > end {
                    self.pos + width
                } else {
                    end
                };
            }

            if fresh {
                return Some(Ok(m));
            }
        }
        None
    }
}
