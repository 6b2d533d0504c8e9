//! Escaping of literal text for use in a pattern

use std::borrow::Cow;

/// Bytes that carry a meaning somewhere in the pattern syntax
const SPECIAL: &[u8] = b"()[]{}?*+-|^$\\.&~# \t\n\r\x0b\x0c";

fn is_special(b: u8) -> bool {
    SPECIAL.contains(&b)
}

/// Escape every metacharacter in `text`, producing a pattern that matches
/// `text` literally.
///
/// Works the same on text and bytes patterns: every special character is
/// ASCII, so multibyte sequences are copied untouched.
pub fn escape(text: &[u8]) -> Cow<'_, [u8]> {
    let Some(first) = text.iter().position(|&b| is_special(b)) else {
        return Cow::Borrowed(text);
    };

    let mut out = Vec::with_capacity(text.len() * 2 - first);
    out.extend_from_slice(&text[..first]);
    for &b in &text[first..] {
        if is_special(b) {
            out.push(b'\\');
        }
        out.push(b);
    }
    Cow::Owned(out)
}
