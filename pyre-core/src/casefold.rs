//! Case folding of character ranges
//!
//! Expands a range of code points into every case variant reachable through
//! simple case folding. Used when case-insensitive matching is emulated by
//! spelling out both cases instead of relying on the backend.

use regex_syntax::hir::{ClassUnicode, ClassUnicodeRange};

use crate::categories::class_contains;

/// Smallest code point with a case variant
pub const MIN_FOLD: u32 = 0x41;
/// Largest ASCII code point with a case variant
pub const MAX_FOLD_ASCII: u32 = 0x7a;
/// Largest code point with a case variant
pub const MAX_FOLD_UNICODE: u32 = 0x1e943;

/// Case orbits missing from simple case folding
const IRREGULAR_ORBITS: [&[char]; 2] = [
    &['I', 'i', '\u{130}', '\u{131}'],
    &['\u{fb05}', '\u{fb06}'],
];

const SURROGATE_LO: u32 = 0xd800;
const SURROGATE_HI: u32 = 0xdfff;

/// Return the sorted, merged ranges covering every case variant of `lo..=hi`.
///
/// With `ascii`, only the letters `A-Z` and `a-z` are folded.
pub fn fold_range(lo: u32, hi: u32, ascii: bool) -> Vec<(u32, u32)> {
    let max_fold = if ascii {
        MAX_FOLD_ASCII
    } else {
        MAX_FOLD_UNICODE
    };

    // Nothing to add if the range is full or has no foldable code points.
    if (lo <= MIN_FOLD && hi >= max_fold) || hi < MIN_FOLD || lo > max_fold {
        return vec![(lo, hi)];
    }

    let mut out = Vec::new();
    let (mut lo, mut hi) = (lo, hi);
    if lo < MIN_FOLD {
        out.push((lo, MIN_FOLD - 1));
        lo = MIN_FOLD;
    }
    if hi > max_fold {
        out.push((max_fold + 1, hi));
        hi = max_fold;
    }

    if ascii {
        fold_ascii(lo, hi, &mut out);
    } else {
        fold_unicode(lo, hi, &mut out);
    }

    merge(out)
}

fn fold_ascii(lo: u32, hi: u32, out: &mut Vec<(u32, u32)>) {
    out.push((lo, hi));
    for (start, end, other) in [('A', 'Z', 'a'), ('a', 'z', 'A')] {
        let (start, end, other) = (start as u32, end as u32, other as u32);
        let a = lo.max(start);
        let b = hi.min(end);
        if a <= b {
            out.push((a - start + other, b - start + other));
        }
    }
}

fn fold_unicode(lo: u32, hi: u32, out: &mut Vec<(u32, u32)>) {
    let mut class = ClassUnicode::empty();
    let mut add = |a: u32, b: u32| {
        if let (Some(a), Some(b)) = (char::from_u32(a), char::from_u32(b)) {
            class.push(ClassUnicodeRange::new(a, b));
        }
    };
    if lo < SURROGATE_LO {
        add(lo, hi.min(SURROGATE_LO - 1));
    }
    if hi > SURROGATE_HI {
        add(lo.max(SURROGATE_HI + 1), hi);
    }
    // surrogates have no case
    if lo <= SURROGATE_HI && hi >= SURROGATE_LO {
        out.push((lo.max(SURROGATE_LO), hi.min(SURROGATE_HI)));
    }

    loop {
        let before = class.clone();
        class.case_fold_simple();
        for orbit in IRREGULAR_ORBITS {
            if orbit.iter().any(|&c| class_contains(&class, c)) {
                for &c in orbit {
                    class.push(ClassUnicodeRange::new(c, c));
                }
            }
        }
        if class == before {
            break;
        }
    }

    out.extend(
        class
            .ranges()
            .iter()
            .map(|r| (r.start() as u32, r.end() as u32)),
    );
}

/// Sort ranges and merge the ones that overlap or abut
pub fn merge(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let mut out: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        match out.last_mut() {
            Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
            _ => out.push((lo, hi)),
        }
    }
    out
}
