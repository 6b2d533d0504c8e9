//! Translation of parsed patterns into backend syntax
//!
//! The tree produced by the parser is first scanned to decide whether the
//! primary (linear-time) backend can express it. It is then rendered by a
//! tree walk. Every node passes through a [`Rewrite`] hook before the
//! default rendering; the hooks of the two backends expand categories,
//! emulate case folding, and rename capture groups for the fallback backend.
//!
//! Every literal is written as a hex escape, so the generated text never
//! depends on which characters are special in the destination syntax.

use std::fmt::Write;

use log::debug;

use crate::ast::{AtCode, Direction, MAXREPEAT, Node, RepeatKind, Subpattern};
use crate::casefold::fold_range;
use crate::categories::{byte_ranges, is_ascii_identifier, text_ranges, unicode_shorthand};
use crate::flags::Flags;
use crate::parser::Pattern;

/// Largest bounded repeat count handed to the primary backend
pub const ENGINE_REPEAT_LIMIT: usize = 1000;

/// A set that matches nothing
const NEVER: &str = r"[^\x00-\x{10ffff}]";
/// A set that matches any code point, newline included
const ANY_CHAR: &str = r"[\x00-\x{10ffff}]";
/// ASCII word characters
const ASCII_WORD: &str = r"[\x30-\x39\x41-\x5a\x5f\x61-\x7a]";

/// The matching engine a pattern is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Linear-time automaton engine (`regex-automata`)
    Primary,
    /// Backtracking engine (`fancy-regex`)
    Fallback,
}

/// A pattern rendered for one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// The backend the text is written for
    pub backend: Backend,
    /// Backend-native pattern text
    pub pattern: String,
    /// Synthetic capture names and the group number each one stands for;
    /// only filled for the fallback backend
    pub synthetic_names: Vec<(String, usize)>,
}

/// Choose the backend for a pattern.
///
/// The fallback backend is chosen when it is allowed and either the pattern
/// requests it with [`Flags::FALLBACK`] or the primary backend cannot
/// express the pattern.
pub fn select_backend(pattern: &Pattern, allow_fallback: bool) -> Backend {
    let wants_fallback =
        pattern.flags().contains(Flags::FALLBACK) || !primary_supports(pattern);
    if allow_fallback && wants_fallback {
        Backend::Fallback
    } else {
        Backend::Primary
    }
}

/// Select a backend and render the pattern for it
pub fn translate(pattern: &Pattern, allow_fallback: bool) -> Translation {
    let backend = select_backend(pattern, allow_fallback);
    let text = render(pattern, backend);
    debug!("translated pattern for {:?} backend: {}", backend, text);

    let synthetic_names = match backend {
        Backend::Primary => Vec::new(),
        Backend::Fallback => (1..pattern.groups())
            .map(|gid| (synthetic_name(gid), gid))
            .collect(),
    };

    Translation {
        backend,
        pattern: text,
        synthetic_names,
    }
}

/// Render a pattern for the given backend
pub fn render(pattern: &Pattern, backend: Backend) -> String {
    let names = pattern.state.group_names();
    let hook: &dyn Rewrite = match backend {
        Backend::Primary => &PrimaryRules,
        Backend::Fallback => &FallbackRules,
    };
    let mut writer = Writer {
        out: String::new(),
        text_mode: pattern.text_mode,
        names: &names,
        hook,
    };
    writer.write_header(pattern.flags());
    writer.write_sequence(&pattern.root, pattern.flags(), false);
    writer.out
}

/// Name under which the fallback backend captures group `gid`
pub fn synthetic_name(gid: usize) -> String {
    format!("_g{}", gid)
}

/// Whether the primary backend can express the pattern
pub fn primary_supports(pattern: &Pattern) -> bool {
    if pattern.text_mode
        && pattern
            .state
            .names()
            .keys()
            .any(|name| !is_ascii_identifier(name))
    {
        return false;
    }
    sequence_supported(&pattern.root, pattern.flags())
}

fn sequence_supported(sp: &Subpattern, flags: Flags) -> bool {
    sp.iter().all(|node| node_supported(node, flags))
}

fn node_supported(node: &Node, flags: Flags) -> bool {
    match node {
        Node::Assert { .. }
        | Node::AssertNot { .. }
        | Node::GroupRef(_)
        | Node::GroupRefExists { .. }
        | Node::AtomicGroup(_)
        | Node::Failure => false,
        Node::At(AtCode::EndString) => false,
        Node::At(AtCode::End) => flags.contains(Flags::MULTILINE),
        Node::Branch(items) => items.iter().all(|item| sequence_supported(item, flags)),
        Node::Repeat {
            kind: RepeatKind::Possessive,
            ..
        } => false,
        Node::Repeat { min, max, body, .. } => {
            let bounded = *min > 1 || *max < MAXREPEAT;
            let too_large =
                *min > ENGINE_REPEAT_LIMIT || (*max != MAXREPEAT && *max > ENGINE_REPEAT_LIMIT);
            !(bounded && too_large) && sequence_supported(body, flags)
        }
        Node::Subpattern {
            add_flags,
            del_flags,
            body,
            ..
        } => sequence_supported(body, flags.scoped(*add_flags, *del_flags)),
        _ => true,
    }
}

/// Where the node being written sits
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// The enclosing sequence or set has other members
    pub has_siblings: bool,
    /// The node is a member of a set
    pub in_set: bool,
    /// Flags in effect for the node
    pub flags: Flags,
}

/// Per-node rewrite hook
pub trait Rewrite {
    /// Write `node` and return `true`, or return `false` to use the
    /// default rendering.
    fn rewrite(&self, w: &mut Writer<'_>, node: &Node, ctx: &Context) -> bool;
}

/// Rules for the primary backend
struct PrimaryRules;

impl Rewrite for PrimaryRules {
    fn rewrite(&self, w: &mut Writer<'_>, node: &Node, ctx: &Context) -> bool {
        rewrite_common(w, node, ctx, true)
    }
}

/// Rules for the fallback backend
struct FallbackRules;

impl Rewrite for FallbackRules {
    fn rewrite(&self, w: &mut Writer<'_>, node: &Node, ctx: &Context) -> bool {
        if rewrite_common(w, node, ctx, false) {
            return true;
        }
        match node {
            Node::Subpattern {
                group: Some(gid),
                body,
                ..
            } => {
                let _ = write!(w.out, "(?P<{}>", synthetic_name(*gid));
                w.write_sequence(body, ctx.flags, false);
                w.out.push(')');
                true
            }
            // numbered references are rejected once groups are named
            Node::GroupRef(gid) => {
                let _ = write!(w.out, "\\k<{}>", synthetic_name(*gid));
                true
            }
            Node::GroupRefExists { group, yes, no } => {
                let _ = write!(w.out, "(?(<{}>)", synthetic_name(*group));
                w.write_branches(yes, no.as_ref(), ctx.flags);
                true
            }
            Node::At(at @ (AtCode::Boundary | AtCode::NonBoundary)) if !w.unicode(ctx.flags) => {
                // after a word char, then after a non-word char
                let (a, b) = match at {
                    AtCode::Boundary => ('!', '='),
                    _ => ('=', '!'),
                };
                let _ = write!(
                    w.out,
                    "(?:(?<={w})(?{a}{w})|(?<!{w})(?{b}{w}))",
                    w = ASCII_WORD,
                );
                true
            }
            Node::At(AtCode::End) if !ctx.flags.contains(Flags::MULTILINE) => {
                w.out.push_str(r"(?=\x0a?\z)");
                true
            }
            _ => false,
        }
    }
}

/// Category expansion and case-folding emulation, shared by both backends.
///
/// `shorthand` allows `\p{..}` class names for Unicode categories.
fn rewrite_common(w: &mut Writer<'_>, node: &Node, ctx: &Context, shorthand: bool) -> bool {
    let unicode = w.unicode(ctx.flags);
    let ignorecase = ctx.flags.contains(Flags::IGNORECASE);

    match node {
        Node::Category(cat) => {
            if unicode && shorthand && (!cat.is_negated() || !ctx.has_siblings) {
                w.out.push_str(&unicode_shorthand(*cat));
                return true;
            }
            false
        }
        Node::Literal(c) if ignorecase && needs_fold(*c, *c, unicode) => {
            let ranges = fold_range(*c, *c, !unicode);
            if let [(lo, hi)] = ranges.as_slice() {
                if lo == hi {
                    return false;
                }
            }
            if ctx.in_set {
                w.write_ranges(&ranges);
            } else {
                w.out.push('[');
                w.write_ranges(&ranges);
                w.out.push(']');
            }
            true
        }
        Node::NotLiteral(c) if ignorecase && needs_fold(*c, *c, unicode) => {
            w.out.push_str("[^");
            w.write_ranges(&fold_range(*c, *c, !unicode));
            w.out.push(']');
            true
        }
        Node::Range(lo, hi) if ignorecase && needs_fold(*lo, *hi, unicode) => {
            w.write_ranges(&fold_range(*lo, *hi, !unicode));
            true
        }
        _ => false,
    }
}

/// Whether case folding of `lo..=hi` has to be spelled out.
///
/// Native Unicode folding misses the irregular orbits of `I` and of the
/// `st` ligatures; everything else is left to the backend.
fn needs_fold(lo: u32, hi: u32, unicode: bool) -> bool {
    if !unicode {
        return true;
    }
    [0x49, 0x69, 0x130, 0x131, 0xfb05, 0xfb06]
        .iter()
        .any(|c| (lo..=hi).contains(c))
}

/// Renders a tree as backend-native pattern text
pub struct Writer<'a> {
    out: String,
    text_mode: bool,
    names: &'a [String],
    hook: &'a dyn Rewrite,
}

impl Writer<'_> {
    /// Unicode semantics for categories and case folding
    fn unicode(&self, flags: Flags) -> bool {
        self.text_mode && flags.contains(Flags::UNICODE)
    }

    /// Flags the backend itself is told about.
    ///
    /// Case folding is only delegated in Unicode text scopes.
    fn visible_flags(&self, flags: Flags) -> Flags {
        let mut visible = flags & (Flags::MULTILINE | Flags::DOTALL);
        if flags.contains(Flags::IGNORECASE) && self.unicode(flags) {
            visible |= Flags::IGNORECASE;
        }
        visible
    }

    fn write_header(&mut self, flags: Flags) {
        let letters = self.visible_flags(flags).letters();
        if !letters.is_empty() {
            let _ = write!(self.out, "(?{})", letters);
        }
    }

    /// Write a sequence of nodes; `force_group` wraps a lone branch.
    pub fn write_sequence(&mut self, sp: &Subpattern, flags: Flags, force_group: bool) {
        let ctx = Context {
            has_siblings: force_group || sp.len() > 1,
            in_set: false,
            flags,
        };
        for node in sp {
            self.write_node(node, &ctx);
        }
    }

    /// Write one node, giving the hook the first chance
    pub fn write_node(&mut self, node: &Node, ctx: &Context) {
        let hook = self.hook;
        if hook.rewrite(self, node, ctx) {
            return;
        }

        match node {
            Node::Any => self.out.push('.'),
            Node::Assert { dir, body } | Node::AssertNot { dir, body } => {
                self.out.push_str("(?");
                if *dir == Direction::Behind {
                    self.out.push('<');
                }
                self.out
                    .push(if matches!(node, Node::Assert { .. }) { '=' } else { '!' });
                self.write_sequence(body, ctx.flags, false);
                self.out.push(')');
            }
            Node::At(at) => self.write_at(*at, ctx.flags),
            Node::Branch(items) => {
                if ctx.has_siblings {
                    self.out.push_str("(?:");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push('|');
                    }
                    self.write_sequence(item, ctx.flags, false);
                }
                if ctx.has_siblings {
                    self.out.push(')');
                }
            }
            Node::Category(cat) => {
                let ranges = if !self.text_mode {
                    byte_ranges(*cat)
                } else {
                    text_ranges(*cat, self.unicode(ctx.flags))
                };
                self.write_ranges(&ranges);
            }
            Node::GroupRef(gid) => {
                let _ = write!(self.out, "\\{}", gid);
            }
            Node::GroupRefExists { group, yes, no } => {
                let _ = write!(self.out, "(?({})", group);
                self.write_branches(yes, no.as_ref(), ctx.flags);
            }
            Node::In(members) => self.write_set(members, ctx.flags),
            Node::Literal(c) => {
                if ctx.in_set {
                    self.write_range(*c, *c);
                } else if self.is_surrogate(*c) {
                    self.out.push_str(NEVER);
                } else {
                    self.write_literal(*c);
                }
            }
            Node::Repeat {
                kind,
                min,
                max,
                body,
            } => self.write_repeat(*kind, *min, *max, body, ctx.flags),
            Node::Negate => self.out.push('^'),
            Node::NotLiteral(c) => {
                if self.is_surrogate(*c) {
                    self.out.push_str(ANY_CHAR);
                } else {
                    self.out.push_str("[^");
                    self.write_literal(*c);
                    self.out.push(']');
                }
            }
            Node::Range(lo, hi) => self.write_range(*lo, *hi),
            Node::Subpattern {
                group,
                add_flags,
                del_flags,
                body,
            } => {
                let inner = ctx.flags.scoped(*add_flags, *del_flags);
                self.out.push('(');
                match group {
                    Some(gid) => {
                        if let Some(name) = self.names.get(*gid).filter(|n| !n.is_empty()) {
                            let _ = write!(self.out, "?P<{}>", name);
                        }
                    }
                    None => {
                        let outer = self.visible_flags(ctx.flags);
                        let inside = self.visible_flags(inner);
                        self.out.push('?');
                        self.out.push_str(&(inside - outer).letters());
                        let off = outer - inside;
                        if !off.is_empty() {
                            self.out.push('-');
                            self.out.push_str(&off.letters());
                        }
                        self.out.push(':');
                    }
                }
                self.write_sequence(body, inner, false);
                self.out.push(')');
            }
            Node::AtomicGroup(body) => {
                self.out.push_str("(?>");
                self.write_sequence(body, ctx.flags, false);
                self.out.push(')');
            }
            Node::Failure => self.out.push_str("(?!)"),
        }
    }

    fn write_at(&mut self, at: AtCode, flags: Flags) {
        let ascii_text = self.text_mode && !self.unicode(flags);
        let text = match at {
            AtCode::Beginning => "^",
            AtCode::BeginningString => r"\A",
            AtCode::Boundary if ascii_text => r"(?-u:\b)",
            AtCode::Boundary => r"\b",
            AtCode::NonBoundary if ascii_text => r"(?-u:\B)",
            AtCode::NonBoundary => r"\B",
            AtCode::End => "$",
            AtCode::EndString => r"\z",
        };
        self.out.push_str(text);
    }

    /// Write the arms of a conditional and close it
    fn write_branches(&mut self, yes: &Subpattern, no: Option<&Subpattern>, flags: Flags) {
        self.write_sequence(yes, flags, true);
        if let Some(no) = no {
            self.out.push('|');
            self.write_sequence(no, flags, true);
        }
        self.out.push(')');
    }

    fn write_repeat(
        &mut self,
        kind: RepeatKind,
        min: usize,
        max: usize,
        body: &Subpattern,
        flags: Flags,
    ) {
        let needs_group = match body.items.as_slice() {
            [node] => matches!(
                node,
                Node::Branch(_)
                    | Node::Repeat { .. }
                    | Node::At(_)
                    | Node::Assert { .. }
                    | Node::AssertNot { .. }
            ),
            _ => true,
        };

        if kind == RepeatKind::Possessive {
            self.out.push_str("(?>");
        }
        if needs_group {
            self.out.push_str("(?:");
        }
        self.write_sequence(body, flags, false);
        if needs_group {
            self.out.push(')');
        }

        match (min, max) {
            (0, 1) => self.out.push('?'),
            (0, MAXREPEAT) => self.out.push('*'),
            (1, MAXREPEAT) => self.out.push('+'),
            (min, MAXREPEAT) => {
                let _ = write!(self.out, "{{{},}}", min);
            }
            (min, max) => {
                let _ = write!(self.out, "{{{},{}}}", min, max);
            }
        }

        match kind {
            RepeatKind::Lazy => self.out.push('?'),
            RepeatKind::Possessive => self.out.push(')'),
            RepeatKind::Greedy => {}
        }
    }

    /// Write a set; a set left without members matches nothing (or anything,
    /// when negated).
    fn write_set(&mut self, members: &[Node], flags: Flags) {
        let ctx = Context {
            has_siblings: members.len() > 1,
            in_set: true,
            flags,
        };
        let start = self.out.len();
        let negated = matches!(members.first(), Some(Node::Negate));
        self.out.push('[');
        for member in members {
            self.write_node(member, &ctx);
        }
        let body_len = self.out.len() - start - 1 - usize::from(negated);
        if body_len == 0 {
            self.out.truncate(start);
            self.out.push_str(if negated { ANY_CHAR } else { NEVER });
        } else {
            self.out.push(']');
        }
    }

    /// Write ranges as set members
    pub fn write_ranges(&mut self, ranges: &[(u32, u32)]) {
        for &(lo, hi) in ranges {
            self.write_range(lo, hi);
        }
    }

    /// Write one set member, leaving out surrogate code points in text mode
    fn write_range(&mut self, lo: u32, hi: u32) {
        if self.text_mode && lo <= 0xdfff && hi >= 0xd800 {
            if lo < 0xd800 {
                self.write_range(lo, 0xd7ff);
            }
            if hi > 0xdfff {
                self.write_range(0xe000, hi);
            }
            return;
        }
        self.write_literal(lo);
        if lo != hi {
            self.out.push('-');
            self.write_literal(hi);
        }
    }

    /// Write a code point as a hex escape: `\xHH` or `\x{HHHH}`
    pub fn write_literal(&mut self, c: u32) {
        if c <= 0x7f || (!self.text_mode && c <= 0xff) {
            let _ = write!(self.out, "\\x{:02x}", c);
        } else {
            let _ = write!(self.out, "\\x{{{:04x}}}", c);
        }
    }

    fn is_surrogate(&self, c: u32) -> bool {
        self.text_mode && (0xd800..=0xdfff).contains(&c)
    }
}
