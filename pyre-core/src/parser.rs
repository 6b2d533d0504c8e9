//! Parser for patterns
//!
//! This module provides a recursive descent parser that reads a pattern
//! through a [`Source`] and produces the tree of [`Node`]s. Every error
//! message and position matches Python's `re` module.
//!
//! Grammar (in order of precedence, lowest to highest):
//!   pattern     := alternation
//!   alternation := sequence ( '|' sequence )*
//!   sequence    := ( atom quantifier? )*
//!   quantifier  := ( '*' | '+' | '?' | '{' min? ( ',' max? )? '}' ) ( '?' | '+' )?
//!   atom        := literal | '.' | '^' | '$' | class | group | escape
//!   class       := '[' '^'? class_item+ ']'
//!   class_item  := char | char '-' char | escape
//!   group       := '(' ( '?:' | '?P<' name '>' | '?>' | '?=' | '?!' | '?<=' | '?<!'
//!                      | '?' flags ':' )? alternation ')'
//!                | '(?P=' name ')' | '(?#' comment ')' | '(?' flags ')'
//!                | '(?(' ( name | number ) ')' sequence ( '|' sequence )? ')'

use crate::ast::{
    AtCode, Category, Direction, MAXGROUPS, MAXREPEAT, Node, RepeatKind, Subpattern, unique,
};
use crate::error::{RegexError, Result, SyntaxError, quote};
use crate::flags::{Flags, check_flags};
use crate::groups::ParseState;
use crate::source::Source;

/// Deepest group nesting accepted before parsing gives up
pub const MAX_NESTING: usize = 100;

/// A parsed pattern: the tree plus the final group table and flags
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Top-level sequence of nodes
    pub root: Subpattern,
    /// Group table and resolved global flags
    pub state: ParseState,
    /// Whether the pattern is a text pattern (as opposed to bytes)
    pub text_mode: bool,
}

impl Pattern {
    /// Resolved global flags
    pub fn flags(&self) -> Flags {
        self.state.flags
    }

    /// Number of groups, group 0 included
    pub fn groups(&self) -> usize {
        self.state.groups()
    }

    /// Debug dump of the tree
    pub fn dump(&self) -> String {
        self.root.dump()
    }
}

/// Parser for patterns
pub struct Parser<'a> {
    src: Source<'a>,
    state: ParseState,
}

impl<'a> Parser<'a> {
    /// Create a new parser for `pattern`
    pub fn new(pattern: &'a [u8], text_mode: bool, flags: Flags) -> Self {
        Parser {
            src: Source::new(pattern, text_mode),
            state: ParseState::new(flags),
        }
    }

    /// Parse the entire pattern
    pub fn parse(mut self) -> Result<Pattern> {
        let verbose = self.state.flags.contains(Flags::VERBOSE);
        let root = self.parse_sub(verbose, 0)?;

        self.state.flags = check_flags(self.state.flags, self.src.text_mode())?;

        if self.src.peek().is_some() {
            return Err(self.src.error_here("unbalanced parenthesis"));
        }

        if let Some((gid, pos)) = self.state.unresolved_refs().next() {
            return Err(self
                .src
                .error_at(format!("invalid group reference {}", gid), pos));
        }

        Ok(Pattern {
            root,
            state: self.state,
            text_mode: self.src.text_mode(),
        })
    }

    /// Parse an alternation
    ///
    /// alternation := sequence ( '|' sequence )*
    ///
    /// A common leading node of all alternatives is moved in front of the
    /// branch, and alternatives that are all single literals or sets become
    /// one set.
    fn parse_sub(&mut self, mut verbose: bool, nested: usize) -> Result<Subpattern> {
        let mut items: Vec<Subpattern> = Vec::new();
        loop {
            let first = nested == 0 && items.is_empty();
            items.push(self.parse_internal(verbose, nested + 1, first)?);
            if !self.src.eat('|') {
                break;
            }
            if nested == 0 {
                verbose = self.state.flags.contains(Flags::VERBOSE);
            }
        }

        if items.len() == 1 {
            return Ok(items.remove(0));
        }

        let mut sp = Subpattern::new();

        // factor out a common prefix
        loop {
            let Some(prefix) = items[0].items.first().cloned() else {
                break;
            };
            let shared = items.iter().all(|item| {
                item.items
                    .first()
                    .is_some_and(|node| node.same_prefix(&prefix))
            });
            if !shared {
                break;
            }
            for item in &mut items {
                item.items.remove(0);
            }
            sp.push(prefix);
        }

        let collapsible = items.iter().all(|item| match item.items.as_slice() {
            [Node::Literal(_)] => true,
            [Node::In(members)] => !matches!(members.first(), Some(Node::Negate)),
            _ => false,
        });

        if collapsible {
            let mut set = Vec::new();
            for item in items {
                for node in item.items {
                    match node {
                        Node::In(members) => set.extend(members),
                        other => set.push(other),
                    }
                }
            }
            sp.push(Node::In(unique(set)));
        } else {
            sp.push(Node::Branch(items));
        }

        Ok(sp)
    }

    /// Parse a sequence up to the next `|` or `)`
    fn parse_internal(&mut self, mut verbose: bool, nested: usize, first: bool) -> Result<Subpattern> {
        // two levels of recursion per group
        if nested > 2 * MAX_NESTING + 1 {
            return Err(self.src.error_here("too many nested parentheses"));
        }
        let mut sp = Subpattern::new();

        while let Some(c) = self.src.peek() {
            if c == '|' as u32 || c == ')' as u32 {
                break;
            }
            self.src.read();

            if verbose {
                if is_whitespace(c) {
                    continue;
                }
                if c == '#' as u32 {
                    self.src.skip_until(b'\n');
                    continue;
                }
            }

            match char::from_u32(c) {
                Some('\\') => {
                    let node = self.parse_escape(false)?;
                    sp.push(node);
                }
                Some('[') => {
                    let node = self.parse_class()?;
                    sp.push(node);
                }
                Some('?' | '*' | '+' | '{') => self.parse_repeat(c, &mut sp)?,
                Some('.') => sp.push(Node::Any),
                Some('(') => self.parse_group(&mut sp, &mut verbose, nested, first)?,
                Some('^') => sp.push(Node::At(AtCode::Beginning)),
                Some('$') => sp.push(Node::At(AtCode::End)),
                _ => sp.push(Node::Literal(c)),
            }
        }

        // unpack non-capturing groups without flags
        let mut items = Vec::with_capacity(sp.len());
        for node in sp.items {
            match node {
                Node::Subpattern {
                    group: None,
                    add_flags,
                    del_flags,
                    body,
                } if add_flags.is_empty() && del_flags.is_empty() => items.extend(body.items),
                other => items.push(other),
            }
        }

        Ok(items.into())
    }

    /// Parse a character class; the `[` has been consumed.
    fn parse_class(&mut self) -> Result<Node> {
        let here = self.src.tell() - 1;
        let mut set: Vec<Node> = Vec::new();
        let negate = self.src.eat('^');

        loop {
            let start = self.src.tell();
            let Some(c) = self.src.read() else {
                return Err(self.src.error_at("unterminated character set", here));
            };

            let code1 = if c == ']' as u32 && !set.is_empty() {
                break;
            } else if c == '\\' as u32 {
                self.parse_escape(true)?
            } else {
                Node::Literal(c)
            };

            if !self.src.eat('-') {
                set.push(unwrap_category(code1));
                continue;
            }

            // potential range
            let Some(c2) = self.src.read() else {
                return Err(self.src.error_at("unterminated character set", here));
            };
            if c2 == ']' as u32 {
                set.push(unwrap_category(code1));
                set.push(Node::Literal('-' as u32));
                break;
            }
            let code2 = if c2 == '\\' as u32 {
                self.parse_escape(true)?
            } else {
                Node::Literal(c2)
            };

            match (code1, code2) {
                (Node::Literal(lo), Node::Literal(hi)) if lo <= hi => set.push(Node::Range(lo, hi)),
                _ => {
                    let text = self.src.decode(&self.src.pattern()[start..self.src.tell()]);
                    return Err(self
                        .src
                        .error_at(format!("bad character range {}", text), start));
                }
            }
        }

        let mut set = unique(set);
        if let [Node::Literal(c)] = set.as_slice() {
            let c = *c;
            return Ok(if negate {
                Node::NotLiteral(c)
            } else {
                Node::Literal(c)
            });
        }
        if negate {
            set.insert(0, Node::Negate);
        }
        Ok(Node::In(set))
    }

    /// Turn the previous node into a repeat; `c` is the repeat character.
    fn parse_repeat(&mut self, c: u32, sp: &mut Subpattern) -> Result<()> {
        let here = self.src.tell();

        let (min, max) = match char::from_u32(c) {
            Some('?') => (0, 1),
            Some('*') => (0, MAXREPEAT),
            Some('+') => (1, MAXREPEAT),
            _ => {
                if self.src.peek() == Some('}' as u32) {
                    sp.push(Node::Literal(c));
                    return Ok(());
                }

                let lo = self.src.next_int();
                let hi = if self.src.eat(',') {
                    self.src.next_int()
                } else {
                    lo
                };

                if !self.src.eat('}') {
                    sp.push(Node::Literal(c));
                    self.src.seek(here);
                    return Ok(());
                }

                let min = match lo {
                    Some(min) if min >= MAXREPEAT => return Err(too_large()),
                    Some(min) => min,
                    None => 0,
                };
                let max = match hi {
                    Some(max) if max >= MAXREPEAT => return Err(too_large()),
                    Some(max) if max < min => {
                        return Err(self
                            .src
                            .error_at("min repeat greater than max repeat", here));
                    }
                    Some(max) => max,
                    None => MAXREPEAT,
                };
                (min, max)
            }
        };

        let item = match sp.items.pop() {
            None | Some(Node::At(_)) => {
                return Err(self.src.error_at("nothing to repeat", here - 1));
            }
            Some(node) if node.is_repeat() => {
                return Err(self.src.error_at("multiple repeat", here - 1));
            }
            Some(node) => node,
        };

        let body = match item {
            Node::Subpattern {
                group: None,
                add_flags,
                del_flags,
                body,
            } if add_flags.is_empty() && del_flags.is_empty() => body,
            other => Subpattern::from(vec![other]),
        };

        let kind = if self.src.eat('?') {
            RepeatKind::Lazy
        } else if self.src.eat('+') {
            RepeatKind::Possessive
        } else {
            RepeatKind::Greedy
        };

        sp.push(Node::Repeat {
            kind,
            min,
            max,
            body,
        });
        Ok(())
    }

    /// Parse any construct starting with `(`; the `(` has been consumed.
    fn parse_group(
        &mut self,
        sp: &mut Subpattern,
        verbose: &mut bool,
        nested: usize,
        first: bool,
    ) -> Result<()> {
        let start = self.src.tell() - 1;

        let mut capture = true;
        let mut atomic = false;
        let mut name = None;
        let mut name_start = start;
        let mut add_flags = Flags::empty();
        let mut del_flags = Flags::empty();

        if self.src.eat('?') {
            let Some(c) = self.src.read() else {
                return Err(self.src.error_here("unexpected end of pattern"));
            };

            match char::from_u32(c) {
                Some('P') => {
                    if self.src.eat('<') {
                        name_start = self.src.tell();
                        let value = self.src.get_until(b'>', "group name")?;
                        self.src.check_group_name(&value, name_start)?;
                        name = Some(value);
                    } else if self.src.eat('=') {
                        let at = self.src.tell();
                        let value = self.src.get_until(b')', "group name")?;
                        self.src.check_group_name(&value, at)?;
                        let Some(gid) = self.state.get_by_name(&value) else {
                            return Err(self.src.error_at(
                                format!("unknown group name {}", quote(&value, true)),
                                at,
                            ));
                        };
                        if !self.state.check_group(gid) {
                            return Err(self.src.error_at("cannot refer to an open group", at));
                        }
                        self.check_lookbehind_group(gid)?;
                        sp.push(Node::GroupRef(gid));
                        return Ok(());
                    } else {
                        let Some(c) = self.src.read() else {
                            return Err(self.src.error_here("unexpected end of pattern"));
                        };
                        return Err(self.src.error_at(
                            format!("unknown extension ?P{}", char_text(c)),
                            start + 1,
                        ));
                    }
                }
                Some(':') => capture = false,
                Some('#') => {
                    loop {
                        match self.src.read() {
                            None => {
                                return Err(self
                                    .src
                                    .error_at("missing ), unterminated comment", start));
                            }
                            Some(c) if c == ')' as u32 => break,
                            Some(_) => {}
                        }
                    }
                    return Ok(());
                }
                Some(kind @ ('=' | '!' | '<')) => {
                    return self.parse_lookaround(kind, start, sp, *verbose, nested);
                }
                Some('(') => return self.parse_conditional(start, sp, *verbose, nested),
                Some('>') => {
                    capture = false;
                    atomic = true;
                }
                _ if Flags::from_letter(c).is_some() || c == '-' as u32 => {
                    match self.parse_flags(c)? {
                        None => {
                            if !first || !sp.is_empty() {
                                return Err(self.src.error_at(
                                    "global flags not at the start of the expression",
                                    start,
                                ));
                            }
                            *verbose = self.state.flags.contains(Flags::VERBOSE);
                            return Ok(());
                        }
                        Some((add, del)) => {
                            add_flags = add;
                            del_flags = del;
                            capture = false;
                        }
                    }
                }
                _ => {
                    return Err(self
                        .src
                        .error_at(format!("unknown extension ?{}", char_text(c)), start + 1));
                }
            }
        }

        let group = if capture {
            let gid = self
                .state
                .open_group(name.as_deref())
                .map_err(|e| self.src.error_at(e.to_string(), name_start))?;
            Some(gid)
        } else {
            None
        };

        let sub_verbose =
            (*verbose || add_flags.contains(Flags::VERBOSE)) && !del_flags.contains(Flags::VERBOSE);
        let body = self.parse_sub(sub_verbose, nested + 1)?;

        if !self.src.eat(')') {
            return Err(self
                .src
                .error_at("missing ), unterminated subpattern", start));
        }

        if let Some(gid) = group {
            self.state.close_group(gid);
        }

        sp.push(if atomic {
            Node::AtomicGroup(body)
        } else {
            Node::Subpattern {
                group,
                add_flags,
                del_flags,
                body,
            }
        });
        Ok(())
    }

    /// Parse a look-ahead or look-behind; `kind` is the character after `(?`.
    fn parse_lookaround(
        &mut self,
        kind: char,
        start: usize,
        sp: &mut Subpattern,
        verbose: bool,
        nested: usize,
    ) -> Result<()> {
        let (dir, kind) = if kind == '<' {
            let Some(c) = self.src.read() else {
                return Err(self.src.error_here("unexpected end of pattern"));
            };
            if c != '=' as u32 && c != '!' as u32 {
                return Err(self
                    .src
                    .error_at(format!("unknown extension ?<{}", char_text(c)), start + 1));
            }
            (Direction::Behind, c)
        } else {
            (Direction::Ahead, kind as u32)
        };

        let saved = (dir == Direction::Behind).then(|| self.state.enter_lookbehind());
        let body = self.parse_sub(verbose, nested + 1)?;
        if let Some(saved) = saved {
            self.state.exit_lookbehind(saved);
        }

        if !self.src.eat(')') {
            return Err(self
                .src
                .error_at("missing ), unterminated subpattern", start));
        }

        if kind == '=' as u32 {
            sp.push(Node::Assert { dir, body });
        } else if !body.is_empty() {
            sp.push(Node::AssertNot { dir, body });
        } else {
            sp.push(Node::Failure);
        }
        Ok(())
    }

    /// Parse `(?(id)yes|no)`; `(?(` has been consumed.
    fn parse_conditional(
        &mut self,
        start: usize,
        sp: &mut Subpattern,
        verbose: bool,
        nested: usize,
    ) -> Result<()> {
        let at = self.src.tell();
        let cond = self.src.get_until(b')', "group name")?;

        let group = if cond.bytes().all(|b| b.is_ascii_digit()) {
            let gid = match cond.parse::<usize>() {
                Ok(0) => return Err(self.src.error_at("bad group number", at)),
                Ok(gid) if gid < MAXGROUPS => gid,
                _ => {
                    return Err(self
                        .src
                        .error_at(format!("invalid group reference {}", cond), at));
                }
            };
            self.state.note_ref(gid, at);
            gid
        } else {
            self.src.check_group_name(&cond, at)?;
            match self.state.get_by_name(&cond) {
                Some(gid) => gid,
                None => {
                    return Err(self.src.error_at(
                        format!("unknown group name {}", quote(&cond, true)),
                        at,
                    ));
                }
            }
        };

        self.check_lookbehind_group(group)?;

        let yes = self.parse_internal(verbose, nested + 1, false)?;
        let no = if self.src.eat('|') {
            let no = self.parse_internal(verbose, nested + 1, false)?;
            if self.src.peek() == Some('|' as u32) {
                return Err(self
                    .src
                    .error_here("conditional backref with more than two branches"));
            }
            Some(no)
        } else {
            None
        };

        if !self.src.eat(')') {
            return Err(self
                .src
                .error_at("missing ), unterminated subpattern", start));
        }

        sp.push(Node::GroupRefExists { group, yes, no });
        Ok(())
    }

    /// Parse inline flags starting with `c`.
    ///
    /// Returns `None` for a global flag group `(?flags)`, whose flags are
    /// merged into the parse state, or the added and removed flags of a
    /// scoped group `(?flags-flags:...)`.
    fn parse_flags(&mut self, mut c: u32) -> Result<Option<(Flags, Flags)>> {
        let text_mode = self.src.text_mode();
        let mut add = Flags::empty();
        let mut del = Flags::empty();

        if c != '-' as u32 {
            loop {
                if text_mode && c == 'L' as u32 {
                    return Err(self
                        .src
                        .error_here("bad inline flags: cannot use 'L' flag with a str pattern"));
                }
                if !text_mode && c == 'u' as u32 {
                    return Err(self
                        .src
                        .error_here("bad inline flags: cannot use 'u' flag with a bytes pattern"));
                }

                let flag = Flags::from_letter(c).unwrap_or_default();
                add |= flag;
                if flag.intersects(Flags::TYPE_FLAGS) && (add & Flags::TYPE_FLAGS) != flag {
                    return Err(self
                        .src
                        .error_here("bad inline flags: flags 'a', 'u' and 'L' are incompatible"));
                }

                c = self
                    .src
                    .read()
                    .ok_or_else(|| self.src.error_here("missing -, : or )"))?;
                if c == ')' as u32 || c == '-' as u32 || c == ':' as u32 {
                    break;
                }
                if Flags::from_letter(c).is_none() {
                    return Err(self.flag_error(c, "missing -, : or )"));
                }
            }
        }

        if c == ')' as u32 {
            self.state.flags |= add;
            return Ok(None);
        }

        if add.intersects(Flags::GLOBAL_FLAGS) {
            return Err(self
                .src
                .error_back("bad inline flags: cannot turn on global flag", 1));
        }

        if c == '-' as u32 {
            c = self
                .src
                .read()
                .ok_or_else(|| self.src.error_here("missing flag"))?;
            if Flags::from_letter(c).is_none() {
                return Err(self.flag_error(c, "missing flag"));
            }
            loop {
                let flag = Flags::from_letter(c).unwrap_or_default();
                if flag.intersects(Flags::TYPE_FLAGS) {
                    return Err(self
                        .src
                        .error_here("bad inline flags: cannot turn off flags 'a', 'u' and 'L'"));
                }
                del |= flag;

                c = self
                    .src
                    .read()
                    .ok_or_else(|| self.src.error_here("missing :"))?;
                if c == ':' as u32 {
                    break;
                }
                if Flags::from_letter(c).is_none() {
                    return Err(self.flag_error(c, "missing :"));
                }
            }
        }

        if del.intersects(Flags::GLOBAL_FLAGS) {
            return Err(self
                .src
                .error_back("bad inline flags: cannot turn off global flag", 1));
        }
        if add.intersects(del) {
            return Err(self
                .src
                .error_back("bad inline flags: flag turned on and off", 1));
        }

        Ok(Some((add, del)))
    }

    /// Error for an unexpected character `c` inside a flag group
    fn flag_error(&self, c: u32, missing: &str) -> RegexError {
        let msg = if is_ascii_letter(c) {
            "unknown flag"
        } else {
            missing
        };
        self.src.error_back(msg, self.src.last_len())
    }

    /// Parse an escape sequence; the backslash has been consumed.
    ///
    /// Returns a `Literal`, `GroupRef`, `At`, or an `In` holding one category.
    fn parse_escape(&mut self, in_class: bool) -> Result<Node> {
        let start = self.src.tell() - 1;
        let Some(c) = self.src.read() else {
            return Err(self.src.error_at("bad escape (end of pattern)", start));
        };
        let text_mode = self.src.text_mode();
        let ch = char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER);

        let node = match ch {
            'x' => {
                let digits = self.src.next_hex(2);
                if digits.len() != 2 {
                    return Err(self
                        .src
                        .error_at(format!("incomplete escape \\x{}", digits), start));
                }
                Node::Literal(parse_radix(digits, 16))
            }
            'u' | 'U' if text_mode => {
                let size = if ch == 'u' { 4 } else { 8 };
                let digits = self.src.next_hex(size);
                if digits.len() != size {
                    return Err(self
                        .src
                        .error_at(format!("incomplete escape \\{}{}", ch, digits), start));
                }
                let value = parse_radix(digits, 16);
                if value > char::MAX as u32 {
                    return Err(self
                        .src
                        .error_at(format!("bad escape \\{}{}", ch, digits), start));
                }
                Node::Literal(value)
            }
            'N' if text_mode => {
                if !self.src.eat('{') {
                    return Err(self.src.error_here("missing {"));
                }
                let name = self.src.get_until(b'}', "character name")?;
                match unicode_names2::character(&name.to_uppercase()) {
                    Some(c) => Node::Literal(c as u32),
                    None => {
                        return Err(self.src.error_at(
                            format!("undefined character name {}", quote(&name, true)),
                            start,
                        ));
                    }
                }
            }
            '0' => Node::Literal(parse_radix(self.src.next_oct(2), 8)),
            '1'..='9' => return self.parse_numeric_escape(ch, start, in_class),
            'a' => Node::Literal(0x07),
            'b' if in_class => Node::Literal(0x08),
            'b' => Node::At(AtCode::Boundary),
            'f' => Node::Literal(0x0c),
            'n' => Node::Literal(0x0a),
            'r' => Node::Literal(0x0d),
            't' => Node::Literal(0x09),
            'v' => Node::Literal(0x0b),
            '\\' => Node::Literal(0x5c),
            'A' if !in_class => Node::At(AtCode::BeginningString),
            'B' if !in_class => Node::At(AtCode::NonBoundary),
            'Z' if !in_class => Node::At(AtCode::EndString),
            'd' => category(Category::Digit),
            'D' => category(Category::NotDigit),
            's' => category(Category::Space),
            'S' => category(Category::NotSpace),
            'w' => category(Category::Word),
            'W' => category(Category::NotWord),
            _ if !ch.is_ascii_alphabetic() => Node::Literal(c),
            _ => {
                return Err(self.src.error_at(format!("bad escape \\{}", ch), start));
            }
        };
        Ok(node)
    }

    /// Parse `\1`..`\9`: an octal escape or, outside a class, a group reference.
    fn parse_numeric_escape(&mut self, c: char, start: usize, in_class: bool) -> Result<Node> {
        let mut value = digit(c as u32);

        if !in_class {
            if let Some(c1) = self.src.peek().filter(|&c1| is_digit(c1)) {
                self.src.read();
                if is_oct_digit(c as u32) && is_oct_digit(c1) {
                    if let Some(c2) = self.src.peek().filter(|&c2| is_oct_digit(c2)) {
                        self.src.read();
                        let value = 8 * (8 * value + digit(c1)) + digit(c2);
                        if value > 0o377 {
                            return Err(self.src.error_at(
                                format!(
                                    "octal escape value \\{}{}{} outside of range 0-0o377",
                                    c,
                                    char_text(c1),
                                    char_text(c2)
                                ),
                                start,
                            ));
                        }
                        return Ok(Node::Literal(value));
                    }
                }
                value = 10 * value + digit(c1);
            }

            let group = value as usize;
            if group < self.state.groups() {
                if !self.state.check_group(group) {
                    return Err(self.src.error_at("cannot refer to an open group", start));
                }
                self.check_lookbehind_group(group)?;
                return Ok(Node::GroupRef(group));
            }
            return Err(self
                .src
                .error_at(format!("invalid group reference {}", value), start + 1));
        }

        if c >= '8' {
            return Err(self.src.error_at(format!("bad escape \\{}", c), start));
        }

        let digits = self.src.next_oct(2);
        let value = (value << (3 * digits.len())) + parse_radix(digits, 8);
        if value > 0o377 {
            return Err(self.src.error_at(
                format!("octal escape value \\{}{} outside of range 0-0o377", c, digits),
                start,
            ));
        }
        Ok(Node::Literal(value))
    }

    fn check_lookbehind_group(&self, gid: usize) -> Result<()> {
        self.state
            .check_lookbehind_group(gid)
            .map_err(|e| self.src.error_here(e.to_string()))
    }
}

/// Parse a pattern into its tree
///
/// `text_mode` selects between text patterns (UTF-8, Unicode semantics) and
/// bytes patterns. `flags` are the flags passed by the caller; inline flags
/// of the pattern are merged in and the result is validated.
///
/// # Errors
/// Returns a [`RegexError::Syntax`] for malformed patterns and a
/// [`RegexError::Flags`] for incompatible flags.
pub fn parse(pattern: &[u8], text_mode: bool, flags: Flags) -> Result<Pattern> {
    Parser::new(pattern, text_mode, flags).parse()
}

fn category(cat: Category) -> Node {
    Node::In(vec![Node::Category(cat)])
}

/// A category escape inside a class is stored as the bare category
fn unwrap_category(node: Node) -> Node {
    match node {
        Node::In(mut members) if members.len() == 1 => members.remove(0),
        other => other,
    }
}

fn too_large() -> RegexError {
    SyntaxError::bare("the repetition number is too large").into()
}

fn char_text(c: u32) -> char {
    char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Digits come from the hex and octal scanners, so parsing cannot fail.
fn parse_radix(digits: &str, radix: u32) -> u32 {
    u32::from_str_radix(digits, radix).unwrap_or(0)
}

fn digit(c: u32) -> u32 {
    c - '0' as u32
}

fn is_digit(c: u32) -> bool {
    ('0' as u32..='9' as u32).contains(&c)
}

fn is_oct_digit(c: u32) -> bool {
    ('0' as u32..='7' as u32).contains(&c)
}

fn is_ascii_letter(c: u32) -> bool {
    char::from_u32(c).is_some_and(|c| c.is_ascii_alphabetic())
}

/// Whitespace skipped in verbose mode
fn is_whitespace(c: u32) -> bool {
    matches!(c, 0x20 | 0x09 | 0x0a | 0x0d | 0x0b | 0x0c)
}
