//! Pyre Core Library
//!
//! A compiler for Python `re` patterns. Patterns are parsed with Python's
//! exact rules and error messages, translated into the syntax of one of two
//! backends (the linear-time `regex-automata` or the backtracking
//! `fancy-regex`) and searched with Python's match iteration semantics.

pub mod ast;
pub mod casefold;
pub mod categories;
pub mod config;
pub mod engine;
pub mod error;
pub mod escape;
pub mod finder;
pub mod flags;
pub mod groups;
pub mod parser;
pub mod replace;
pub mod source;
pub mod transpiler;

pub use ast::{AtCode, Category, Direction, Node, RepeatKind, Subpattern};
pub use casefold::fold_range;
pub use config::CompileOptions;
pub use engine::{Engine, Input, Match};
pub use error::{RegexError, Result, SyntaxError};
pub use escape::escape;
pub use finder::{Finder, find_match, find_matches, split};
pub use flags::Flags;
pub use groups::{GroupError, ParseState};
pub use parser::{MAX_NESTING, Parser, Pattern, parse};
pub use replace::{Template, TemplateRule, parse_template, substitute};
pub use transpiler::{Backend, Translation, translate};

/// Compile a pattern with default options
///
/// This is the main entry point. `text_mode` selects text (UTF-8) or bytes
/// semantics; with `allow_fallback` unset, patterns the linear-time backend
/// cannot express fail to compile.
pub fn compile(pattern: &[u8], text_mode: bool, flags: Flags, allow_fallback: bool) -> Result<Box<dyn Engine>> {
    CompileOptions::new()
        .allow_fallback(allow_fallback)
        .compile(pattern, text_mode, flags)
}

/// Parse a pattern and return its tree dump
pub fn dump(pattern: &[u8], text_mode: bool, flags: Flags) -> Result<String> {
    Ok(parse(pattern, text_mode, flags)?.dump())
}
