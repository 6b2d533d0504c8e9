//! Compatibility test suite
//!
//! Tests that compare pyre behavior against Python's `re` module: the
//! expected values below are what CPython produces for the same calls.

use pyre_core::{
    Backend, CompileOptions, Engine, Finder, Flags, RegexError, Template, compile, dump, escape, find_match, fold_range,
    split, substitute,
};

fn engine(pattern: &str) -> Box<dyn Engine> {
    compile(pattern.as_bytes(), true, Flags::empty(), true).unwrap()
}

/// Span of the first match, like `re.search(pattern, text).span()`
fn search(pattern: &str, text: &str) -> Option<(usize, usize)> {
    let engine = engine(pattern);
    find_match(engine.as_ref(), text.as_bytes(), 0, false)
        .unwrap()
        .map(|m| m.span())
}

/// Spans of every match, like `[m.span() for m in re.finditer(pattern, text)]`
fn finditer(pattern: &str, text: &str, flags: Flags) -> Vec<(usize, usize)> {
    let engine = compile(pattern.as_bytes(), true, flags, true).unwrap();
    Finder::new(engine.as_ref(), text.as_bytes(), 0)
        .map(|m| m.unwrap().span())
        .collect()
}

fn error(pattern: &str) -> RegexError {
    compile(pattern.as_bytes(), true, Flags::empty(), true).unwrap_err()
}

mod parsing {
    use super::*;

    #[test]
    fn test_single_char_alternation_is_a_set() {
        assert_eq!(dump(b"a|b|c", true, Flags::empty()).unwrap(), dump(b"[abc]", true, Flags::empty()).unwrap());
    }

    #[test]
    fn test_common_prefix_is_factored() {
        assert_eq!(
            dump(b"ab|ac", true, Flags::empty()).unwrap(),
            "LITERAL 97\nIN\n  LITERAL 98\n  LITERAL 99"
        );
    }

    #[test]
    fn test_repeat_bounds() {
        assert_eq!(dump(b"a{,5}", true, Flags::empty()).unwrap(), dump(b"a{0,5}", true, Flags::empty()).unwrap());
        assert_eq!(search("a{", "xa{"), Some((1, 3)));
        assert_eq!(search("a{1,x}", "a{1,x}"), Some((0, 6)));
    }

    #[test]
    fn test_group_numbering() {
        let engine = engine("(?P<year>\\d+)-(\\d+)-(?P<day>\\d+)");
        assert_eq!(engine.subexp_count(), 3);
        assert_eq!(engine.subexp_index("year"), Some(1));
        assert_eq!(engine.subexp_index("day"), Some(3));
        assert_eq!(engine.subexp_names()[2], "");
    }

    #[test]
    fn test_debug_flag_keeps_dump() {
        let engine = compile(b"a+", true, Flags::DEBUG, true).unwrap();
        assert_eq!(engine.debug_dump(), Some("MAX_REPEAT 1 MAXREPEAT\n  LITERAL 97"));
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_messages_with_position() {
        assert_eq!(error("a{2,1}").to_string(), "min repeat greater than max repeat at position 2");
        assert_eq!(error("\\1").to_string(), "invalid group reference 1 at position 1");
        assert_eq!(error("(a").to_string(), "missing ), unterminated subpattern at position 0");
        assert_eq!(error("a)").to_string(), "unbalanced parenthesis at position 1");
        assert_eq!(error("[a").to_string(), "unterminated character set at position 0");
    }

    #[test]
    fn test_multiline_position() {
        assert_eq!(
            error("a\n(b").to_string(),
            "missing ), unterminated subpattern at position 2 (line 2, column 1)"
        );
    }

    #[test]
    fn test_group_rules() {
        assert_eq!(
            error("(?P<x>a)(?P<x>b)").message(),
            "redefinition of group name 'x' as group 2; was group 1"
        );
        assert_eq!(
            error("(?<=(a)\\1)").message(),
            "cannot refer to group defined in the same lookbehind subpattern"
        );
        assert_eq!(error("(a\\1)").message(), "cannot refer to an open group");
    }

    #[test]
    fn test_flag_errors() {
        assert_eq!(
            error("(?L)a").message(),
            "bad inline flags: cannot use 'L' flag with a str pattern"
        );
        let err = compile(b"\\u0041", false, Flags::empty(), true).unwrap_err();
        assert_eq!(err.to_string(), "bad escape \\u at position 0");
    }

    #[test]
    fn test_deep_nesting() {
        let pattern = "(".repeat(5000);
        assert_eq!(error(&pattern).message(), "too many nested parentheses");
    }

    #[test]
    fn test_unsupported_without_fallback() {
        for pattern in ["a$", "a{2000}", "(a)\\1", "(?P<x>a)(?(x)b)"] {
            let err = compile(pattern.as_bytes(), true, Flags::empty(), false).unwrap_err();
            assert!(matches!(err, RegexError::Compile(_)), "{}", pattern);
        }
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(error("("), RegexError::Syntax(_)));
        assert_eq!(error("(").position(), Some(0));
        let err = compile(b"(?=a)", true, Flags::empty(), false).unwrap_err();
        assert!(matches!(err, RegexError::Compile(_)));
    }
}

mod matching {
    use super::*;

    #[test]
    fn test_backreferences() {
        assert_eq!(search("(a)\\1", "xaa"), Some((1, 3)));
        assert_eq!(search("(?P<q>['\"]).*?(?P=q)", "say 'hi' now"), Some((4, 8)));
        assert_eq!(search("(a)\\1", "ab"), None);
    }

    #[test]
    fn test_ignorecase() {
        assert_eq!(search("(?i)hello", "HeLLo"), Some((0, 5)));
        assert_eq!(search("(?i)k", "\u{212a}"), Some((0, 3)));
        assert_eq!(search("(?ai)k", "\u{212a}"), None);
        assert_eq!(search("(?ai)k", "K"), Some((0, 1)));
        assert_eq!(search("(?i)i", "\u{130}"), Some((0, 2)));
        assert_eq!(search("(?i)i", "\u{131}"), Some((0, 2)));
        assert_eq!(search("(?i)[h-j]+", "HI\u{131}"), Some((0, 4)));
    }

    #[test]
    fn test_unicode_and_ascii_categories() {
        assert_eq!(search("\\w+", "caf\u{e9}!"), Some((0, 5)));
        assert_eq!(search("(?a)\\w+", "caf\u{e9}!"), Some((0, 3)));
        assert_eq!(search("\\d", "x\u{663}"), Some((1, 3)));
        assert_eq!(search("(?a)\\d", "x\u{663}"), None);
        assert_eq!(search("[\\s\\d]+", "x 1 2y"), Some((1, 5)));
        assert_eq!(search("\\s", "\u{1c}"), Some((0, 1)));
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(search("\\bx", "\u{e9}x"), None);
        assert_eq!(search("(?a)\\bx", "\u{e9}x"), Some((2, 3)));
        assert_eq!(search("(?a)\\bx(?=y)", "\u{e9}xy"), Some((2, 3)));
    }

    #[test]
    fn test_dot_and_anchors() {
        assert_eq!(search("a.b", "a\nb"), None);
        assert_eq!(search("(?s)a.b", "a\nb"), Some((0, 3)));
        assert_eq!(search("^b", "a\nb"), None);
        assert_eq!(search("(?m)^b", "a\nb"), Some((2, 3)));
        assert_eq!(search("a$", "a\n"), Some((0, 1)));
        assert_eq!(search("a$", "a\nb"), None);
        assert_eq!(search("a\\Z", "a\n"), None);
        assert_eq!(search("a\\Z", "ba"), Some((1, 2)));
        assert_eq!(search("\\Ab", "ab"), None);
    }

    #[test]
    fn test_lookaround() {
        assert_eq!(search("(?<=a)b", "ab"), Some((1, 2)));
        assert_eq!(search("(?<!a)b", "ab"), None);
        assert_eq!(search("(?<!a)b", "cb"), Some((1, 2)));
        assert_eq!(search("a(?!b)", "abac"), Some((2, 3)));
    }

    #[test]
    fn test_conditional() {
        assert_eq!(search("(a)?(?(1)b|c)", "ab"), Some((0, 2)));
        assert_eq!(search("(a)?(?(1)b|c)", "c"), Some((0, 1)));
        assert_eq!(search("^(a)?(?(1)b|c)$", "b"), None);
        assert_eq!(search("(?P<o><)?x(?(o)>)", "<x>"), Some((0, 3)));
    }

    #[test]
    fn test_atomic_and_possessive() {
        assert_eq!(search("a++a", "aaa"), None);
        assert_eq!(search("(?>a+)a", "aaa"), None);
        assert_eq!(search("a*+b", "aab"), Some((0, 3)));
    }

    #[test]
    fn test_verbose_and_named_escapes() {
        assert_eq!(search("(?x) a b  # comment", "ab"), Some((0, 2)));
        assert_eq!(search("(?x)[ ]", " "), Some((0, 1)));
        assert_eq!(search("\\N{EM DASH}", "a\u{2014}"), Some((1, 4)));
    }

    #[test]
    fn test_bytes_patterns() {
        let engine = compile(b"\\xff.", false, Flags::empty(), true).unwrap();
        let m = find_match(engine.as_ref(), b"a\xff\xc3", 0, false).unwrap().unwrap();
        assert_eq!(m.span(), (1, 3));

        let engine = compile(b"(?i)caf\xc9", false, Flags::empty(), true).unwrap();
        assert!(find_match(engine.as_ref(), b"CAF\xe9", 0, false).unwrap().is_none());
        assert!(find_match(engine.as_ref(), b"CAF\xc9", 0, false).unwrap().is_some());
    }

    #[test]
    fn test_invalid_utf8_haystack() {
        let engine = engine("b");
        let m = find_match(engine.as_ref(), b"\xffb", 0, false).unwrap().unwrap();
        assert_eq!(m.span(), (1, 2));

        let engine = compile(b"(?<=\\xff)b", true, Flags::empty(), true).unwrap();
        let m = find_match(engine.as_ref(), b"\xffb", 0, false).unwrap().unwrap();
        assert_eq!(m.span(), (1, 2));
    }

    #[test]
    fn test_large_repeats_use_fallback() {
        let engine = engine("a{1001}");
        assert_eq!(engine.backend(), Backend::Fallback);
        let text = "a".repeat(1001);
        let m = find_match(engine.as_ref(), text.as_bytes(), 0, false).unwrap().unwrap();
        assert_eq!(m.span(), (0, 1001));
        assert_eq!(super::engine("a{1000}").backend(), Backend::Primary);
    }

    #[test]
    fn test_group_spans() {
        let engine = engine("(a)|(b)");
        let m = find_match(engine.as_ref(), b"b", 0, false).unwrap().unwrap();
        assert_eq!(m.offsets(), vec![0, 1, -1, -1, 0, 1]);
    }
}

mod finder {
    use super::*;

    #[test]
    fn test_star_on_full_match() {
        assert_eq!(finditer("a*", "aaa", Flags::empty()), vec![(0, 3), (3, 3)]);
    }

    #[test]
    fn test_empty_matches() {
        assert_eq!(finditer("x*", "abc", Flags::empty()), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
        assert_eq!(finditer("\\b", "ab cd", Flags::empty()), vec![(0, 0), (2, 2), (3, 3), (5, 5)]);
    }

    #[test]
    fn test_empty_match_next_to_match() {
        assert_eq!(
            finditer("\\d*", "a12b", Flags::empty()),
            vec![(0, 0), (1, 3), (3, 3), (4, 4)]
        );
    }

    #[test]
    fn test_backends_agree_on_greedy_patterns() {
        for pattern in ["a*", "b+", "[ab]?", "(ab)*", "x*", "a|bc", "\\w*"] {
            for text in ["", "aab", "abab c", "bcbca"] {
                assert_eq!(
                    finditer(pattern, text, Flags::empty()),
                    finditer(pattern, text, Flags::FALLBACK),
                    "{} on {:?}",
                    pattern,
                    text
                );
            }
        }
    }

    #[test]
    fn test_empty_alternative_on_every_position() {
        assert_eq!(
            finditer("|a", "aa", Flags::empty()),
            vec![(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)]
        );
    }

    #[test]
    fn test_split() {
        let engine = engine("(,)?\\s");
        let pieces = split(engine.as_ref(), b"a, b c", 0).unwrap();
        let expected: Vec<Option<&[u8]>> = vec![Some(&b"a"[..]), Some(&b","[..]), Some(&b"b"[..]), None, Some(&b"c"[..])];
        assert_eq!(pieces, expected);
    }

    #[test]
    fn test_escape_round_trip() {
        let text = "1.5 * (x + y) ^ 2 $ [ok]";
        let pattern = String::from_utf8(escape(text.as_bytes()).into_owned()).unwrap();
        assert_eq!(search(&pattern, &format!(">>{}<<", text)), Some((2, 2 + text.len())));
    }

    #[test]
    fn test_endpos() {
        let engine = engine("\\w+$");
        let found: Vec<_> = Finder::with_endpos(engine.as_ref(), b"ab cd", 0, 2)
            .map(|m| m.unwrap().span())
            .collect();
        assert_eq!(found, vec![(0, 2)]);
    }

    #[test]
    fn test_runtime_errors_surface() {
        let engine = CompileOptions::new()
            .backtrack_limit(1000)
            .compile(b"(?i)(a|b|ab)*(?=c)", true, Flags::empty())
            .unwrap();
        let text = "ab".repeat(40);
        let results: Vec<_> = Finder::new(engine.as_ref(), text.as_bytes(), 0).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(RegexError::Runtime(_))));
    }
}

mod templates {
    use super::*;

    #[test]
    fn test_group_reference() {
        let engine = engine("(Q)");
        let template = Template::parse(engine.as_ref(), b"x\\g<1>yz", true).unwrap();
        let (out, n) = substitute(engine.as_ref(), &template, b"Q", 0).unwrap();
        assert_eq!(out, b"xQyz");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_unknown_group() {
        let engine = engine("(a)");
        let err = Template::parse(engine.as_ref(), b"\\g<name>", true).unwrap_err();
        assert_eq!(err.to_string(), "unknown group name 'name'");
        let err = Template::parse(engine.as_ref(), b"\\2", true).unwrap_err();
        assert_eq!(err.to_string(), "invalid group reference 2");
    }

    #[test]
    fn test_empty_matches_are_replaced() {
        let engine = engine("x*");
        let template = Template::parse(engine.as_ref(), b"-", true).unwrap();
        let (out, n) = substitute(engine.as_ref(), &template, b"abxd", 0).unwrap();
        assert_eq!(out, b"-a-b--d-");
        assert_eq!(n, 5);
    }
}

mod case_folding {
    use super::*;

    #[test]
    fn test_ascii_upper() {
        assert_eq!(fold_range('A' as u32, 'Z' as u32, true), vec![(0x41, 0x5a), (0x61, 0x7a)]);
    }

    #[test]
    fn test_kelvin_sign() {
        let ranges = fold_range('k' as u32, 'k' as u32, false);
        assert!(ranges.contains(&(0x212a, 0x212a)));
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    const PATTERNS: &[&str] = &["a*", "ab|b", "(a)(b)?", "a*?", "[ab]+", "(?i)A", "\\w+", "x*", "(a)\\1", "(?<=a)b"];

    proptest! {
        #[test]
        fn test_compile_is_deterministic(pattern in prop::sample::select(PATTERNS), text in "[abAB ]{0,12}") {
            let a = engine(pattern);
            let b = engine(pattern);
            prop_assert_eq!(a.native_pattern(), b.native_pattern());
            prop_assert_eq!(a.subexp_names(), b.subexp_names());

            let left: Vec<_> = Finder::new(a.as_ref(), text.as_bytes(), 0).map(|m| m.unwrap()).collect();
            let right: Vec<_> = Finder::new(b.as_ref(), text.as_bytes(), 0).map(|m| m.unwrap()).collect();
            prop_assert_eq!(left, right);
        }

        #[test]
        fn test_matches_advance(pattern in prop::sample::select(PATTERNS), text in "[abAB ]{0,12}") {
            let engine = engine(pattern);
            let spans: Vec<_> = Finder::new(engine.as_ref(), text.as_bytes(), 0)
                .map(|m| m.unwrap().span())
                .collect();
            for (start, end) in &spans {
                prop_assert!(start <= end && *end <= text.len());
            }
            for pair in spans.windows(2) {
                prop_assert!(pair[0] != pair[1]);
                prop_assert!(pair[1].0 >= pair[0].0);
            }
        }

        #[test]
        fn test_fold_is_closed(lo in 0u32..0x3000, len in 0u32..64, ascii in any::<bool>()) {
            let hi = lo + len;
            let folded = fold_range(lo, hi, ascii);
            prop_assert!(folded.iter().any(|&(a, b)| a <= lo && hi <= b));
            for pair in folded.windows(2) {
                prop_assert!(pair[0].1 + 1 < pair[1].0);
            }
            let mut again: Vec<(u32, u32)> = folded
                .iter()
                .flat_map(|&(a, b)| fold_range(a, b, ascii))
                .collect();
            again = pyre_core::casefold::merge(again);
            prop_assert_eq!(again, folded);
        }
    }
}
