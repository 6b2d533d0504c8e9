//! Compile options
//!
//! [`CompileOptions`] carries the knobs that are not part of the pattern
//! itself: whether the backtracking backend may be used and the resource
//! limits handed to both backends.

use log::debug;

use crate::engine::{self, Engine};
use crate::error::Result;
use crate::flags::Flags;
use crate::parser::parse;

/// Default step limit of the backtracking backend
pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;
/// Default size limit of compiled automata, in bytes
pub const DEFAULT_SIZE_LIMIT: usize = 10 * (1 << 20);
/// Default cache capacity of the lazy DFA, in bytes
pub const DEFAULT_DFA_SIZE_LIMIT: usize = 2 * (1 << 20);

/// Options for compiling a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    allow_fallback: bool,
    backtrack_limit: usize,
    size_limit: usize,
    dfa_size_limit: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            allow_fallback: true,
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            size_limit: DEFAULT_SIZE_LIMIT,
            dfa_size_limit: DEFAULT_DFA_SIZE_LIMIT,
        }
    }
}

impl CompileOptions {
    /// Options with every default
    pub fn new() -> Self {
        CompileOptions::default()
    }

    /// Allow or forbid the backtracking backend.
    ///
    /// When forbidden, patterns the primary backend cannot express fail
    /// to compile.
    pub fn allow_fallback(mut self, yes: bool) -> Self {
        self.allow_fallback = yes;
        self
    }

    /// Limit the number of backtracking steps of a single search
    pub fn backtrack_limit(mut self, limit: usize) -> Self {
        self.backtrack_limit = limit;
        self
    }

    /// Limit the size of compiled automata
    pub fn size_limit(mut self, limit: usize) -> Self {
        self.size_limit = limit;
        self
    }

    /// Limit the cache of the lazy DFA
    pub fn dfa_size_limit(mut self, limit: usize) -> Self {
        self.dfa_size_limit = limit;
        self
    }

    pub fn allows_fallback(&self) -> bool {
        self.allow_fallback
    }

    pub fn get_backtrack_limit(&self) -> usize {
        self.backtrack_limit
    }

    pub fn get_size_limit(&self) -> usize {
        self.size_limit
    }

    pub fn get_dfa_size_limit(&self) -> usize {
        self.dfa_size_limit
    }

    /// Parse, translate and compile a pattern
    ///
    /// # Errors
    /// Returns a syntax or flags error for an invalid pattern, and a compile
    /// error if the chosen backend rejects the translated pattern.
    pub fn compile(&self, pattern: &[u8], text_mode: bool, flags: Flags) -> Result<Box<dyn Engine>> {
        let parsed = parse(pattern, text_mode, flags)?;
        let engine = engine::build(&parsed, self)?;
        debug!(
            "compiled {} group(s) for the {:?} backend",
            engine.subexp_count(),
            engine.backend()
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::Backend;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::new();
        assert!(options.allows_fallback());
        assert_eq!(options.get_backtrack_limit(), DEFAULT_BACKTRACK_LIMIT);
    }

    #[test]
    fn test_builder() {
        let options = CompileOptions::new()
            .allow_fallback(false)
            .backtrack_limit(10)
            .size_limit(1 << 16);
        assert!(!options.allows_fallback());
        assert_eq!(options.get_backtrack_limit(), 10);
        assert_eq!(options.get_size_limit(), 1 << 16);
    }

    #[test]
    fn test_forbidden_fallback_is_a_compile_error() {
        let options = CompileOptions::new().allow_fallback(false);
        let err = options.compile(b"(a)\\1", true, Flags::empty()).unwrap_err();
        assert!(matches!(err, crate::error::RegexError::Compile(_)));
        let err = options.compile(b"a$", true, Flags::empty()).unwrap_err();
        assert!(matches!(err, crate::error::RegexError::Compile(_)));

        let engine = CompileOptions::new()
            .compile(b"(a)\\1", true, Flags::empty())
            .unwrap();
        assert_eq!(engine.backend(), Backend::Fallback);
    }
}
