//! Character classes behind the category escapes
//!
//! Unicode classes are built once with `regex-syntax` and cached. ASCII and
//! bytes classes are small fixed tables. Every class is returned as sorted,
//! non-overlapping inclusive ranges of code points (or byte values).

use lazy_static::lazy_static;
use regex_syntax::ParserBuilder;
use regex_syntax::hir::{Class, ClassBytes, ClassBytesRange, ClassUnicode, ClassUnicodeRange, HirKind};

use crate::ast::Category;

/// Unicode digits, matching `str.isdecimal`
pub const UNICODE_DIGIT: &str = r"\p{Nd}";
/// Unicode whitespace, matching `str.isspace`
pub const UNICODE_SPACE: &str = r"\x09-\x0d\x1c-\x20\x{85}\p{Z}";
/// Unicode word characters, matching `str.isalnum` plus `_`
pub const UNICODE_WORD: &str = r"\p{L}\p{N}\x5f";

const XID_START_CLASS: &str = r"_\p{XID_Start}";
const XID_CONTINUE_CLASS: &str = r"\p{XID_Continue}";

lazy_static! {
    static ref DIGIT: ClassUnicode = unicode_class(UNICODE_DIGIT).unwrap_or_else(ClassUnicode::empty);
    static ref SPACE: ClassUnicode = unicode_class(UNICODE_SPACE).unwrap_or_else(ClassUnicode::empty);
    static ref WORD: ClassUnicode = unicode_class(UNICODE_WORD).unwrap_or_else(ClassUnicode::empty);
    static ref XID_START: ClassUnicode = unicode_class(XID_START_CLASS).unwrap_or_else(ClassUnicode::empty);
    static ref XID_CONTINUE: ClassUnicode =
        unicode_class(XID_CONTINUE_CLASS).unwrap_or_else(ClassUnicode::empty);
}

/// Parse the members of a bracketed class with `regex-syntax`.
///
/// Returns `None` if `members` does not make a Unicode class.
fn unicode_class(members: &str) -> Option<ClassUnicode> {
    let pattern = format!("[{}]", members);
    match ParserBuilder::new().build().parse(&pattern).ok()?.into_kind() {
        HirKind::Class(Class::Unicode(class)) => Some(class),
        _ => None,
    }
}

fn ascii_ranges(category: Category) -> &'static [(u8, u8)] {
    match category.base() {
        Category::Digit => &[(b'0', b'9')],
        Category::Space => &[(b'\t', b'\r'), (b' ', b' ')],
        _ => &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')],
    }
}

/// The short `\p{..}` spelling of a Unicode category for use inside a set.
///
/// Negated categories include the leading `^`, so they are only usable when
/// the category is the sole member of its set.
pub fn unicode_shorthand(category: Category) -> String {
    match category {
        Category::Digit => UNICODE_DIGIT.to_string(),
        Category::NotDigit => r"\P{Nd}".to_string(),
        Category::Space => UNICODE_SPACE.to_string(),
        Category::NotSpace => format!("^{}", UNICODE_SPACE),
        Category::Word => UNICODE_WORD.to_string(),
        Category::NotWord => format!("^{}", UNICODE_WORD),
    }
}

/// Ranges of code points matched by a category in a text pattern
pub fn text_ranges(category: Category, unicode: bool) -> Vec<(u32, u32)> {
    let mut class = if unicode {
        match category.base() {
            Category::Digit => DIGIT.clone(),
            Category::Space => SPACE.clone(),
            _ => WORD.clone(),
        }
    } else {
        ClassUnicode::new(ascii_ranges(category).iter().map(|&(lo, hi)| {
            ClassUnicodeRange::new(char::from(lo), char::from(hi))
        }))
    };
    if category.is_negated() {
        class.negate();
    }
    class
        .ranges()
        .iter()
        .map(|r| (r.start() as u32, r.end() as u32))
        .collect()
}

/// Ranges of byte values matched by a category in a bytes pattern
pub fn byte_ranges(category: Category) -> Vec<(u32, u32)> {
    let mut class = ClassBytes::new(
        ascii_ranges(category)
            .iter()
            .map(|&(lo, hi)| ClassBytesRange::new(lo, hi)),
    );
    if category.is_negated() {
        class.negate();
    }
    class
        .ranges()
        .iter()
        .map(|r| (r.start() as u32, r.end() as u32))
        .collect()
}

pub(crate) fn class_contains(class: &ClassUnicode, c: char) -> bool {
    class
        .ranges()
        .binary_search_by(|r| {
            if r.end() < c {
                std::cmp::Ordering::Less
            } else if r.start() > c {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

/// Whether `name` is a valid identifier: `_` or XID_Start, then XID_Continue.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if class_contains(&XID_START, first) => {
            chars.all(|c| class_contains(&XID_CONTINUE, c))
        }
        _ => false,
    }
}

/// Whether `name` is an ASCII identifier, the naming rule of the primary backend.
pub fn is_ascii_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {
            bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }
        _ => false,
    }
}
