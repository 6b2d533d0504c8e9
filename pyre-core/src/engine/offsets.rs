//! Haystack normalization with offset correction
//!
//! Both backends need well-formed text in some cases: the primary backend
//! runs in Unicode mode for text patterns, and the fallback backend only
//! searches `&str`. A haystack that is not valid UTF-8 is rewritten so that
//! every offending byte becomes the code point of the same value. The
//! [`Normalized`] value keeps tables to translate positions between the
//! original and the rewritten haystack.

use std::borrow::Cow;

use log::trace;

use crate::source::decode_utf8;

/// A haystack rewritten as valid UTF-8
#[derive(Debug, Clone)]
pub struct Normalized<'h> {
    text: Cow<'h, str>,
    table: Option<OffsetTable>,
}

/// Position tables between an original and a rewritten haystack.
///
/// Both tables have one entry per byte plus one for the end.
#[derive(Debug, Clone, Default)]
struct OffsetTable {
    to_norm: Vec<usize>,
    to_orig: Vec<usize>,
}

impl<'h> Normalized<'h> {
    /// Keep valid UTF-8 sequences and widen every invalid byte
    pub fn repair_utf8(haystack: &'h [u8]) -> Self {
        match std::str::from_utf8(haystack) {
            Ok(text) => Normalized::borrowed(text),
            Err(_) => Normalized::rewrite(haystack, true),
        }
    }

    /// Widen every byte to the code point of the same value
    pub fn widen_bytes(haystack: &'h [u8]) -> Self {
        if haystack.is_ascii() {
            // ASCII is valid UTF-8 with one byte per character
            if let Ok(text) = std::str::from_utf8(haystack) {
                return Normalized::borrowed(text);
            }
        }
        Normalized::rewrite(haystack, false)
    }

    /// A translator for a haystack used as is
    pub fn identity() -> Normalized<'static> {
        Normalized {
            text: Cow::Borrowed(""),
            table: None,
        }
    }

    fn borrowed(text: &'h str) -> Self {
        Normalized {
            text: Cow::Borrowed(text),
            table: None,
        }
    }

    fn rewrite(haystack: &[u8], keep_utf8: bool) -> Self {
        let mut text = String::with_capacity(haystack.len() + haystack.len() / 2);
        let mut table = OffsetTable {
            to_norm: Vec::with_capacity(haystack.len() + 1),
            to_orig: Vec::with_capacity(haystack.len() + haystack.len() / 2 + 1),
        };

        let mut pos = 0;
        while pos < haystack.len() {
            let decoded = if keep_utf8 {
                decode_utf8(&haystack[pos..]).and_then(|(c, len)| Some((char::from_u32(c)?, len)))
            } else {
                None
            };
            let (c, len) = decoded.unwrap_or((char::from(haystack[pos]), 1));

            let start = text.len();
            text.push(c);
            table.to_norm.extend(std::iter::repeat_n(start, len));
            table.to_orig.extend(std::iter::repeat_n(pos, c.len_utf8()));
            pos += len;
        }
        table.to_norm.push(text.len());
        table.to_orig.push(haystack.len());

        trace!(
            "normalized haystack of {} bytes into {} bytes",
            haystack.len(),
            text.len()
        );
        Normalized {
            text: Cow::Owned(text),
            table: Some(table),
        }
    }

    /// The rewritten haystack
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether positions need translating
    pub fn is_rewritten(&self) -> bool {
        self.table.is_some()
    }

    /// Translate an original position into the rewritten haystack.
    ///
    /// Positions inside a multi-byte character map to the start of that
    /// character. Past the end of a rewritten haystack they map to its end.
    pub fn to_norm(&self, pos: usize) -> usize {
        match &self.table {
            None => pos,
            Some(table) => table.to_norm[pos.min(table.to_norm.len() - 1)],
        }
    }

    /// Translate a rewritten position back into the original haystack
    pub fn to_orig(&self, pos: usize) -> usize {
        match &self.table {
            None => pos,
            Some(table) => table.to_orig[pos.min(table.to_orig.len() - 1)],
        }
    }

    /// Turn into the rewritten bytes and a position translator
    pub fn into_bytes(self) -> (Cow<'h, [u8]>, Normalized<'static>) {
        let bytes = match self.text {
            Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
            Cow::Owned(text) => Cow::Owned(text.into_bytes()),
        };
        let translator = Normalized {
            text: Cow::Owned(String::new()),
            table: self.table,
        };
        (bytes, translator)
    }
}
