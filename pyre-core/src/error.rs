//! Error types for the pattern compiler
//!
//! This module provides error handling using the `thiserror` crate.
//! Errors are categorized by their source: pattern syntax, flag validation,
//! replacement templates, backend compilation, or matching at runtime.
//!
//! Syntax errors render exactly like the messages of Python's `re` module,
//! including the `at position N` suffix and, for multi-line patterns, the
//! `(line L, column C)` suffix.

use std::fmt;

use thiserror::Error;

/// The main error type of the crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// Malformed pattern syntax, reported with its location
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    /// Incompatible global flags
    #[error("{0}")]
    Flags(String),

    /// Malformed replacement template
    #[error("{0}")]
    Template(String),

    /// The backend rejected the translated pattern
    #[error("compilation error: {0}")]
    Compile(String),

    /// The backend failed while matching
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl RegexError {
    /// The message without any location suffix
    pub fn message(&self) -> &str {
        match self {
            RegexError::Syntax(e) => &e.msg,
            RegexError::Flags(msg)
            | RegexError::Template(msg)
            | RegexError::Compile(msg)
            | RegexError::Runtime(msg) => msg,
        }
    }

    /// Byte offset into the pattern, if the error has one
    pub fn position(&self) -> Option<usize> {
        match self {
            RegexError::Syntax(e) => e.location.map(|loc| loc.pos),
            _ => None,
        }
    }
}

/// Location of a syntax error inside the pattern text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset of the error
    pub pos: usize,
    /// Line and column, only present when the pattern spans several lines
    pub line_col: Option<(usize, usize)>,
}

impl Location {
    /// Compute the location of `pos` inside `pattern`
    pub fn new(pattern: &[u8], pos: usize) -> Self {
        let pos = pos.min(pattern.len());
        let line_col = if pattern.contains(&b'\n') {
            let before = &pattern[..pos];
            let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
            let column = match before.iter().rposition(|&b| b == b'\n') {
                Some(nl) => pos - nl,
                None => pos + 1,
            };
            Some((line, column))
        } else {
            None
        };
        Location { pos, line_col }
    }
}

/// A pattern syntax error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// The message, worded like the reference dialect
    pub msg: String,
    /// Where the error occurred; `None` for errors without a position
    pub location: Option<Location>,
}

impl SyntaxError {
    /// Create an error located at `pos` in `pattern`
    pub fn at(msg: impl Into<String>, pattern: &[u8], pos: usize) -> Self {
        SyntaxError {
            msg: msg.into(),
            location: Some(Location::new(pattern, pos)),
        }
    }

    /// Create an error without a position
    pub fn bare(msg: impl Into<String>) -> Self {
        SyntaxError {
            msg: msg.into(),
            location: None,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)?;
        if let Some(loc) = self.location {
            write!(f, " at position {}", loc.pos)?;
            if let Some((line, column)) = loc.line_col {
                write!(f, " (line {}, column {})", line, column)?;
            }
        }
        Ok(())
    }
}

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, RegexError>;

/// Quote a name the way Python's `repr` does for `str` values.
///
/// In bytes mode, everything outside printable ASCII is escaped.
pub fn quote(name: &str, text_mode: bool) -> String {
    let delim = if name.contains('\'') && !name.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(name.len() + 2);
    out.push(delim);
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if !c.is_ascii() && !text_mode => out.push_str(&escape_char(c as u32)),
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Escape every non-ASCII character of a message; used for bytes patterns.
pub fn ascii_escape(msg: &str) -> String {
    let mut out = String::with_capacity(msg.len());
    for c in msg.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&escape_char(c as u32));
        }
    }
    out
}

fn escape_char(c: u32) -> String {
    if c <= 0xff {
        format!("\\x{:02x}", c)
    } else if c <= 0xffff {
        format!("\\u{:04x}", c)
    } else {
        format!("\\U{:08x}", c)
    }
}
