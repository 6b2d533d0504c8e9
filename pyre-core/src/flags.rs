//! Compile flags
//!
//! The bit values are those of Python's `re` module so that callers can pass
//! flag integers straight through. `FALLBACK` is an extension that forces the
//! backtracking backend.

use bitflags::bitflags;

use crate::error::{RegexError, Result};

bitflags! {
    /// A set of compile options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        /// Case-insensitive matching (`i`)
        const IGNORECASE = 1 << 1;
        /// Locale dependent matching, bytes patterns only (`L`)
        const LOCALE = 1 << 2;
        /// `^` and `$` match at line boundaries (`m`)
        const MULTILINE = 1 << 3;
        /// `.` matches a newline (`s`)
        const DOTALL = 1 << 4;
        /// Unicode matching, the default for text patterns (`u`)
        const UNICODE = 1 << 5;
        /// Whitespace and comments are ignored (`x`)
        const VERBOSE = 1 << 6;
        /// Produce a dump of the parsed tree
        const DEBUG = 1 << 7;
        /// ASCII-only matching for categories and case folding (`a`)
        const ASCII = 1 << 8;
        /// Always use the fallback backend
        const FALLBACK = 1 << 9;
    }
}

impl Flags {
    /// Flags that select how characters are classified; at most one may be set.
    pub const TYPE_FLAGS: Flags = Flags::ASCII.union(Flags::LOCALE).union(Flags::UNICODE);

    /// Flags that may only be set by a leading, unscoped flag group.
    pub const GLOBAL_FLAGS: Flags = Flags::DEBUG;

    /// Flags the backends understand as inline modifiers.
    pub const INLINE_FLAGS: Flags = Flags::IGNORECASE
        .union(Flags::MULTILINE)
        .union(Flags::DOTALL);

    /// Map an inline flag letter to its flag
    pub fn from_letter(c: u32) -> Option<Flags> {
        let flag = match char::from_u32(c)? {
            'i' => Flags::IGNORECASE,
            'L' => Flags::LOCALE,
            'm' => Flags::MULTILINE,
            's' => Flags::DOTALL,
            'x' => Flags::VERBOSE,
            'a' => Flags::ASCII,
            'u' => Flags::UNICODE,
            _ => return None,
        };
        Some(flag)
    }

    /// Inline letters of the set, in the order `aiLmsux`
    pub fn letters(self) -> String {
        const ORDER: [(Flags, char); 7] = [
            (Flags::ASCII, 'a'),
            (Flags::IGNORECASE, 'i'),
            (Flags::LOCALE, 'L'),
            (Flags::MULTILINE, 'm'),
            (Flags::DOTALL, 's'),
            (Flags::UNICODE, 'u'),
            (Flags::VERBOSE, 'x'),
        ];
        ORDER
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, c)| *c)
            .collect()
    }

    /// Flags in effect inside a scoped group `(?add-del:...)`.
    ///
    /// Adding a type flag replaces the inherited one.
    pub fn scoped(self, add: Flags, del: Flags) -> Flags {
        let mut flags = self;
        if add.intersects(Flags::TYPE_FLAGS) {
            flags.remove(Flags::TYPE_FLAGS);
        }
        (flags | add) - del
    }
}

/// Validate the global flags once parsing is complete.
///
/// Text patterns get `UNICODE` unless `ASCII` was requested.
pub fn check_flags(mut flags: Flags, text_mode: bool) -> Result<Flags> {
    if text_mode {
        if flags.contains(Flags::LOCALE) {
            return Err(RegexError::Flags(
                "cannot use LOCALE flag with a str pattern".to_string(),
            ));
        }
        if !flags.contains(Flags::ASCII) {
            flags |= Flags::UNICODE;
        } else if flags.contains(Flags::UNICODE) {
            return Err(RegexError::Flags(
                "ASCII and UNICODE flags are incompatible".to_string(),
            ));
        }
    } else {
        if flags.contains(Flags::UNICODE) {
            return Err(RegexError::Flags(
                "cannot use UNICODE flag with a bytes pattern".to_string(),
            ));
        }
        if flags.contains(Flags::LOCALE | Flags::ASCII) {
            return Err(RegexError::Flags(
                "ASCII and LOCALE flags are incompatible".to_string(),
            ));
        }
    }
    Ok(flags)
}
