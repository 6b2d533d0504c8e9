//! Abstract Syntax Tree (AST) for parsed patterns
//!
//! The tree mirrors the node model of Python's `sre_parse`: a [`Subpattern`]
//! is an ordered sequence of [`Node`]s, and nodes own their nested
//! subpatterns. Backreferences store a plain group number, so the tree never
//! contains back-edges.

use std::fmt::{self, Write};

use crate::flags::Flags;

/// Unbounded repeat count, and the exclusive cap on explicit counts
pub const MAXREPEAT: usize = u32::MAX as usize;

/// Upper bound on the number of groups a pattern may declare
pub const MAXGROUPS: usize = (i32::MAX as usize) / 2;

/// Zero-width positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtCode {
    /// `^`
    Beginning,
    /// `\A`
    BeginningString,
    /// `\b`
    Boundary,
    /// `\B`
    NonBoundary,
    /// `$`
    End,
    /// `\Z`
    EndString,
}

impl AtCode {
    /// Name used in the debug dump
    pub fn name(self) -> &'static str {
        match self {
            AtCode::Beginning => "AT_BEGINNING",
            AtCode::BeginningString => "AT_BEGINNING_STRING",
            AtCode::Boundary => "AT_BOUNDARY",
            AtCode::NonBoundary => "AT_NON_BOUNDARY",
            AtCode::End => "AT_END",
            AtCode::EndString => "AT_END_STRING",
        }
    }
}

/// Category escapes: `\d \D \s \S \w \W`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Digit,
    NotDigit,
    Space,
    NotSpace,
    Word,
    NotWord,
}

impl Category {
    /// Name used in the debug dump
    pub fn name(self) -> &'static str {
        match self {
            Category::Digit => "CATEGORY_DIGIT",
            Category::NotDigit => "CATEGORY_NOT_DIGIT",
            Category::Space => "CATEGORY_SPACE",
            Category::NotSpace => "CATEGORY_NOT_SPACE",
            Category::Word => "CATEGORY_WORD",
            Category::NotWord => "CATEGORY_NOT_WORD",
        }
    }

    /// Whether the category is the complement of a base category
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            Category::NotDigit | Category::NotSpace | Category::NotWord
        )
    }

    /// The non-negated category of the same kind
    pub fn base(self) -> Category {
        match self {
            Category::NotDigit => Category::Digit,
            Category::NotSpace => Category::Space,
            Category::NotWord => Category::Word,
            other => other,
        }
    }
}

/// How a repeat consumes input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatKind {
    /// `*`, `+`, `?`, `{m,n}`
    Greedy,
    /// `*?`, `+?`, `??`, `{m,n}?`
    Lazy,
    /// `*+`, `++`, `?+`, `{m,n}+`
    Possessive,
}

/// Direction of a look-around assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ahead,
    Behind,
}

impl Direction {
    fn value(self) -> i32 {
        match self {
            Direction::Ahead => 1,
            Direction::Behind => -1,
        }
    }
}

/// A node in the parsed tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Never matches: `(?!)`
    Failure,
    /// `.`
    Any,
    /// `(?=...)` or `(?<=...)`
    Assert { dir: Direction, body: Subpattern },
    /// `(?!...)` or `(?<!...)`
    AssertNot { dir: Direction, body: Subpattern },
    /// Anchors and boundaries
    At(AtCode),
    /// Alternatives separated by `|`
    Branch(Vec<Subpattern>),
    /// A category; only appears as a member of [`Node::In`]
    Category(Category),
    /// Backreference to a group number
    GroupRef(usize),
    /// `(?(id)yes|no)`
    GroupRefExists {
        group: usize,
        yes: Subpattern,
        no: Option<Subpattern>,
    },
    /// A set; members are `Negate` (first only), `Literal`, `Range` or `Category`
    In(Vec<Node>),
    /// A single code point (or byte value in bytes mode)
    Literal(u32),
    /// A repeated subpattern
    Repeat {
        kind: RepeatKind,
        min: usize,
        max: usize,
        body: Subpattern,
    },
    /// Marks a negated set
    Negate,
    /// Any code point but one: `[^x]`
    NotLiteral(u32),
    /// An inclusive range inside a set
    Range(u32, u32),
    /// A group, capturing when `group` is set, with scoped flags
    Subpattern {
        group: Option<usize>,
        add_flags: Flags,
        del_flags: Flags,
        body: Subpattern,
    },
    /// `(?>...)`
    AtomicGroup(Subpattern),
}

impl Node {
    /// Opcode name used in the debug dump
    pub fn opcode(&self) -> &'static str {
        match self {
            Node::Failure => "FAILURE",
            Node::Any => "ANY",
            Node::Assert { .. } => "ASSERT",
            Node::AssertNot { .. } => "ASSERT_NOT",
            Node::At(_) => "AT",
            Node::Branch(_) => "BRANCH",
            Node::Category(_) => "CATEGORY",
            Node::GroupRef(_) => "GROUPREF",
            Node::GroupRefExists { .. } => "GROUPREF_EXISTS",
            Node::In(_) => "IN",
            Node::Literal(_) => "LITERAL",
            Node::Repeat {
                kind: RepeatKind::Lazy,
                ..
            } => "MIN_REPEAT",
            Node::Repeat {
                kind: RepeatKind::Greedy,
                ..
            } => "MAX_REPEAT",
            Node::Repeat {
                kind: RepeatKind::Possessive,
                ..
            } => "POSSESSIVE_REPEAT",
            Node::Negate => "NEGATE",
            Node::NotLiteral(_) => "NOT_LITERAL",
            Node::Range(..) => "RANGE",
            Node::Subpattern { .. } => "SUBPATTERN",
            Node::AtomicGroup(_) => "ATOMIC_GROUP",
        }
    }

    /// Equality as used when factoring a common prefix out of alternatives.
    ///
    /// Nodes that own a subpattern never compare equal: two groups spelled
    /// alike are still distinct groups.
    pub fn same_prefix(&self, other: &Node) -> bool {
        match (self, other) {
            (
                Node::Assert { .. }
                | Node::AssertNot { .. }
                | Node::Branch(_)
                | Node::GroupRefExists { .. }
                | Node::Repeat { .. }
                | Node::Subpattern { .. }
                | Node::AtomicGroup(_),
                _,
            ) => false,
            _ => self == other,
        }
    }

    /// Whether the node is a repeat of any kind
    pub fn is_repeat(&self) -> bool {
        matches!(self, Node::Repeat { .. })
    }
}

/// An ordered sequence of nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subpattern {
    pub items: Vec<Node>,
}

impl Subpattern {
    /// Create an empty subpattern
    pub fn new() -> Self {
        Subpattern { items: Vec::new() }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the subpattern has no nodes
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a node
    pub fn push(&mut self, node: Node) {
        self.items.push(node);
    }

    /// The last node, if any
    pub fn last(&self) -> Option<&Node> {
        self.items.last()
    }

    /// Iterate over the nodes
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    /// Render the debug dump of this subpattern
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.dump_level(&mut out, 0);
        out.trim_end_matches(['\n', ' ']).to_string()
    }

    fn dump_level(&self, out: &mut String, level: usize) -> fmt::Result {
        let indent = "  ".repeat(level);
        for node in &self.items {
            write!(out, "{}{}", indent, node.opcode())?;
            match node {
                Node::In(members) => {
                    writeln!(out)?;
                    for member in members {
                        write!(out, "{}  {} ", indent, member.opcode())?;
                        match member {
                            Node::Literal(c) => writeln!(out, "{}", c)?,
                            Node::Range(lo, hi) => writeln!(out, "({}, {})", lo, hi)?,
                            Node::Category(cat) => writeln!(out, "{}", cat.name())?,
                            _ => writeln!(out, "None")?,
                        }
                    }
                }
                Node::Branch(items) => {
                    writeln!(out)?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            writeln!(out, "{}OR", indent)?;
                        }
                        item.dump_level(out, level + 1)?;
                    }
                }
                Node::GroupRefExists { group, yes, no } => {
                    writeln!(out, " {}", group)?;
                    yes.dump_level(out, level + 1)?;
                    if let Some(no) = no {
                        writeln!(out, "{}ELSE", indent)?;
                        no.dump_level(out, level + 1)?;
                    }
                }
                Node::Assert { dir, body } | Node::AssertNot { dir, body } => {
                    writeln!(out, " {}", dir.value())?;
                    body.dump_level(out, level + 1)?;
                }
                Node::Repeat { min, max, body, .. } => {
                    if *max == MAXREPEAT {
                        writeln!(out, " {} MAXREPEAT", min)?;
                    } else {
                        writeln!(out, " {} {}", min, max)?;
                    }
                    body.dump_level(out, level + 1)?;
                }
                Node::Subpattern {
                    group,
                    add_flags,
                    del_flags,
                    body,
                } => {
                    match group {
                        Some(g) => write!(out, " {}", g)?,
                        None => write!(out, " None")?,
                    }
                    writeln!(out, " {} {}", add_flags.bits(), del_flags.bits())?;
                    body.dump_level(out, level + 1)?;
                }
                Node::AtomicGroup(body) => {
                    writeln!(out)?;
                    body.dump_level(out, level + 1)?;
                }
                Node::Any => writeln!(out, " None")?,
                Node::At(at) => writeln!(out, " {}", at.name())?,
                Node::Category(cat) => writeln!(out, " {}", cat.name())?,
                Node::GroupRef(g) => writeln!(out, " {}", g)?,
                Node::Literal(c) | Node::NotLiteral(c) => writeln!(out, " {}", c)?,
                Node::Range(lo, hi) => writeln!(out, " ({}, {})", lo, hi)?,
                Node::Failure | Node::Negate => writeln!(out)?,
            }
        }
        Ok(())
    }
}

impl From<Vec<Node>> for Subpattern {
    fn from(items: Vec<Node>) -> Self {
        Subpattern { items }
    }
}

impl<'a> IntoIterator for &'a Subpattern {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Remove duplicate nodes, keeping the first occurrence of each
pub fn unique(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !out.contains(&node) {
            out.push(node);
        }
    }
    out
}
