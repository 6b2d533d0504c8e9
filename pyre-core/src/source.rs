//! Pattern source reader
//!
//! Reads a pattern one code point at a time. Text patterns are decoded as
//! UTF-8; a byte that does not start a valid sequence is returned as the code
//! point with the same value. Bytes patterns are read one byte at a time.
//! All positions are byte offsets into the original pattern.

use crate::categories::is_identifier;
use crate::error::{RegexError, SyntaxError, ascii_escape, quote};

/// Cursor over the pattern text
#[derive(Debug, Clone)]
pub struct Source<'a> {
    orig: &'a [u8],
    pos: usize,
    last: usize,
    text_mode: bool,
}

impl<'a> Source<'a> {
    /// Create a reader at the start of `pattern`
    pub fn new(pattern: &'a [u8], text_mode: bool) -> Self {
        Source {
            orig: pattern,
            pos: 0,
            last: 0,
            text_mode,
        }
    }

    /// Whether the pattern is a text pattern
    pub fn text_mode(&self) -> bool {
        self.text_mode
    }

    /// The whole pattern
    pub fn pattern(&self) -> &'a [u8] {
        self.orig
    }

    /// Current byte offset
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Move the cursor back (or forward) to `pos`
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.orig.len());
    }

    /// The next code point and its encoded length, without consuming it
    fn next(&self) -> Option<(u32, usize)> {
        let rest = &self.orig[self.pos..];
        let first = *rest.first()?;
        if !self.text_mode || first < 0x80 {
            return Some((first as u32, 1));
        }
        Some(decode_utf8(rest).unwrap_or((first as u32, 1)))
    }

    /// Consume and return the next code point
    pub fn read(&mut self) -> Option<u32> {
        let (c, size) = self.next()?;
        self.pos += size;
        self.last = size;
        Some(c)
    }

    /// Return the next code point without consuming it
    pub fn peek(&self) -> Option<u32> {
        self.next().map(|(c, _)| c)
    }

    /// Consume the next code point if it equals `c`
    pub fn eat(&mut self, c: char) -> bool {
        match self.next() {
            Some((next, size)) if next == c as u32 => {
                self.pos += size;
                true
            }
            _ => false,
        }
    }

    /// Skip past the next occurrence of the ASCII byte `c`, or to the end.
    pub fn skip_until(&mut self, c: u8) -> bool {
        match self.orig[self.pos..].iter().position(|&b| b == c) {
            Some(i) => {
                self.pos += i + 1;
                true
            }
            None => {
                self.pos = self.orig.len();
                false
            }
        }
    }

    /// Read everything up to the ASCII delimiter `c` and consume the delimiter.
    ///
    /// `name` describes the expected content in the error messages.
    pub fn get_until(&mut self, c: u8, name: &str) -> Result<String, RegexError> {
        let rest = &self.orig[self.pos..];
        let end = rest.iter().position(|&b| b == c);
        let content = &rest[..end.unwrap_or(rest.len())];
        if content.is_empty() {
            return Err(self.error_here(format!("missing {}", name)));
        }
        let Some(end) = end else {
            return Err(self.error_here(format!("missing {}, unterminated name", c as char)));
        };
        let value = self.decode(content);
        self.pos += end + 1;
        Ok(value)
    }

    /// Read a decimal integer; `None` if no digit is present.
    ///
    /// Values that do not fit saturate at `usize::MAX`.
    pub fn next_int(&mut self) -> Option<usize> {
        let mut value: usize = 0;
        let mut found = false;
        while let Some(&b) = self.orig.get(self.pos) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.saturating_mul(10).saturating_add((b - b'0') as usize);
            found = true;
            self.pos += 1;
        }
        found.then_some(value)
    }

    /// Read up to `n` hexadecimal digits
    pub fn next_hex(&mut self, n: usize) -> &'a str {
        self.next_while(n, |b| b.is_ascii_hexdigit())
    }

    /// Read up to `n` octal digits
    pub fn next_oct(&mut self, n: usize) -> &'a str {
        self.next_while(n, |b| (b'0'..=b'7').contains(&b))
    }

    fn next_while(&mut self, n: usize, accept: impl Fn(u8) -> bool) -> &'a str {
        let rest = &self.orig[self.pos..];
        let len = rest.iter().take(n).take_while(|&&b| accept(b)).count();
        self.pos += len;
        // only ASCII digits were accepted
        std::str::from_utf8(&rest[..len]).unwrap_or_default()
    }

    /// Check a group name that starts at byte offset `start`
    pub fn check_group_name(&self, name: &str, start: usize) -> Result<(), RegexError> {
        if !self.text_mode && !name.is_ascii() {
            return Err(self.error_at(
                format!("bad character in group name {}", quote(name, false)),
                start,
            ));
        }
        if !is_identifier(name) {
            return Err(self.error_at(
                format!("bad character in group name {}", quote(name, self.text_mode)),
                start,
            ));
        }
        Ok(())
    }

    /// Bytes consumed by the most recent `read`
    pub fn last_len(&self) -> usize {
        self.last
    }

    /// Decode a slice of the pattern into a string, mapping every undecodable
    /// byte (or every byte, for bytes patterns) to the code point of that value.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            let (c, size) = if self.text_mode {
                decode_utf8(&bytes[i..]).unwrap_or((bytes[i] as u32, 1))
            } else {
                (bytes[i] as u32, 1)
            };
            out.push(char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER));
            i += size;
        }
        out
    }

    /// An error at an absolute position
    pub fn error_at(&self, msg: impl Into<String>, pos: usize) -> RegexError {
        let msg = msg.into();
        let msg = if self.text_mode { msg } else { ascii_escape(&msg) };
        SyntaxError::at(msg, self.orig, pos).into()
    }

    /// An error at the cursor
    pub fn error_here(&self, msg: impl Into<String>) -> RegexError {
        self.error_at(msg, self.pos)
    }

    /// An error `offset` bytes before the cursor
    pub fn error_back(&self, msg: impl Into<String>, offset: usize) -> RegexError {
        self.error_at(msg, self.pos.saturating_sub(offset))
    }
}

/// Decode one UTF-8 sequence at the start of `bytes`
pub fn decode_utf8(bytes: &[u8]) -> Option<(u32, usize)> {
    let first = *bytes.first()?;
    let width = match first {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return None,
    };
    let seq = bytes.get(..width)?;
    let s = std::str::from_utf8(seq).ok()?;
    s.chars().next().map(|c| (c as u32, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_text() {
        let mut src = Source::new("a\u{e9}b".as_bytes(), true);
        assert_eq!(src.read(), Some('a' as u32));
        assert_eq!(src.read(), Some(0xe9));
        assert_eq!(src.tell(), 3);
        assert_eq!(src.peek(), Some('b' as u32));
        assert!(src.eat('b'));
        assert_eq!(src.read(), None);
    }

    #[test]
    fn test_read_invalid_utf8() {
        let mut src = Source::new(b"a\xffb", true);
        assert_eq!(src.read(), Some('a' as u32));
        assert_eq!(src.read(), Some(0xff));
        assert_eq!(src.tell(), 2);
        assert_eq!(src.read(), Some('b' as u32));
    }

    #[test]
    fn test_last_len() {
        let mut src = Source::new("\u{e9}x".as_bytes(), true);
        src.read();
        assert_eq!(src.last_len(), 2);
        src.read();
        assert_eq!(src.last_len(), 1);
    }

    #[test]
    fn test_read_bytes() {
        let mut src = Source::new("\u{e9}".as_bytes(), false);
        assert_eq!(src.read(), Some(0xc3));
        assert_eq!(src.read(), Some(0xa9));
    }

    #[test]
    fn test_seek() {
        let mut src = Source::new(b"{1,2", true);
        let here = src.tell();
        src.read();
        assert_eq!(src.next_int(), Some(1));
        src.seek(here);
        assert_eq!(src.peek(), Some('{' as u32));
    }

    #[test]
    fn test_get_until() {
        let mut src = Source::new(b"name>rest", true);
        assert_eq!(src.get_until(b'>', "group name").unwrap(), "name");
        assert_eq!(src.peek(), Some('r' as u32));

        let mut src = Source::new(b">", true);
        let err = src.get_until(b'>', "group name").unwrap_err();
        assert_eq!(err.to_string(), "missing group name at position 0");

        let mut src = Source::new(b"(?P<abc", true);
        src.seek(4);
        let err = src.get_until(b'>', "group name").unwrap_err();
        assert_eq!(err.to_string(), "missing >, unterminated name at position 4");
    }

    #[test]
    fn test_next_int() {
        let mut src = Source::new(b"123x", true);
        assert_eq!(src.next_int(), Some(123));
        let mut src = Source::new(b"x", true);
        assert_eq!(src.next_int(), None);
        let mut src = Source::new(b"99999999999999999999999", true);
        assert_eq!(src.next_int(), Some(usize::MAX));
    }

    #[test]
    fn test_hex_and_oct() {
        let mut src = Source::new(b"4fz", true);
        assert_eq!(src.next_hex(4), "4f");
        let mut src = Source::new(b"1289", true);
        assert_eq!(src.next_oct(3), "12");
    }

    #[test]
    fn test_check_group_name() {
        let src = Source::new(b"(?P<1a>x)", true);
        let err = src.check_group_name("1a", 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad character in group name '1a' at position 4"
        );
        assert!(src.check_group_name("_ok", 4).is_ok());
        assert!(src.check_group_name("\u{e9}t\u{e9}", 4).is_ok());
    }

    #[test]
    fn test_bytes_error_is_ascii() {
        let src = Source::new(b"\\\xe9", false);
        let err = src.error_at("bad escape \\\u{e9}", 0);
        assert_eq!(err.to_string(), "bad escape \\\\xe9 at position 0");
    }
}
