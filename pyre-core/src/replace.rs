//! Replacement template handling
//!
//! A template is compiled once against an engine into a list of rules:
//! literal bytes and group references. Group references are `\g<name>`,
//! `\g<number>` and `\1` to `\99`; escapes like `\n` become the character
//! they name, and `\0` plus up to two octal digits (or three octal digits
//! after `\1`..`\7`) spell a character by its octal value.

use crate::ast::MAXGROUPS;
use crate::categories::is_identifier;
use crate::engine::{Engine, Match};
use crate::error::{RegexError, Result, quote};
use crate::finder::Finder;

/// A part of a compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRule {
    /// Literal bytes
    Literal(Vec<u8>),
    /// The text of a group, by number
    Group(usize),
}

/// A compiled replacement template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    rules: Vec<TemplateRule>,
}

impl Template {
    /// Compile `template` against the groups of `engine`
    ///
    /// # Errors
    /// Returns a template error for a malformed escape or a reference to a
    /// group the engine does not have.
    pub fn parse(engine: &dyn Engine, template: &[u8], text_mode: bool) -> Result<Self> {
        let mut out = Template::default();
        let groups = engine.subexp_count();
        let mut rest = template;

        while let Some(i) = rest.iter().position(|&b| b == b'\\') {
            out.push_literal(&rest[..i]);
            let Some(&c) = rest.get(i + 1) else {
                return Err(template_error("bad escape (end of pattern)"));
            };
            rest = &rest[i + 2..];

            match c {
                b'g' => {
                    let (gid, after) = group_reference(engine, rest, text_mode)?;
                    rest = after;
                    out.push_group(gid, groups)?;
                }
                b'0' => {
                    let len = octal_prefix(rest, 2);
                    let value = octal_value(&rest[..len]);
                    rest = &rest[len..];
                    out.push_char(value, text_mode);
                }
                b'1'..=b'9' => {
                    let mut gid = usize::from(c - b'0');
                    if let Some(&d1) = rest.first().filter(|d| d.is_ascii_digit()) {
                        let d2 = rest.get(1).copied();
                        if is_oct_digit(c) && is_oct_digit(d1) && d2.is_some_and(is_oct_digit) {
                            let digits = [c, d1, d2.unwrap_or(b'0')];
                            let value = octal_value(&digits);
                            if value > 0o377 {
                                return Err(template_error(format!(
                                    "octal escape value \\{} outside of range 0-0o377",
                                    String::from_utf8_lossy(&digits)
                                )));
                            }
                            rest = &rest[2..];
                            out.push_char(value, text_mode);
                            continue;
                        }
                        gid = gid * 10 + usize::from(d1 - b'0');
                        rest = &rest[1..];
                    }
                    out.push_group(gid, groups)?;
                }
                _ => match unescape(c) {
                    Some(b) => out.push_literal(&[b]),
                    None if c.is_ascii_alphabetic() => {
                        return Err(template_error(format!("bad escape \\{}", char::from(c))));
                    }
                    None => out.push_literal(&[b'\\', c]),
                },
            }
        }
        out.push_literal(rest);

        Ok(out)
    }

    /// The compiled rules, adjacent literals merged
    pub fn rules(&self) -> &[TemplateRule] {
        &self.rules
    }

    /// The replacement text if the template has no group references
    pub fn as_literal(&self) -> Option<&[u8]> {
        match self.rules.as_slice() {
            [] => Some(&[]),
            [TemplateRule::Literal(bytes)] => Some(bytes),
            _ => None,
        }
    }

    /// Append the expansion of the template for match `m` of `text`.
    ///
    /// Groups that did not participate expand to nothing.
    pub fn expand(&self, m: &Match, text: &[u8], out: &mut Vec<u8>) {
        for rule in &self.rules {
            match rule {
                TemplateRule::Literal(bytes) => out.extend_from_slice(bytes),
                TemplateRule::Group(gid) => {
                    if let Some(group) = m.group_bytes(text, *gid) {
                        out.extend_from_slice(group);
                    }
                }
            }
        }
    }

    fn push_literal(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        match self.rules.last_mut() {
            Some(TemplateRule::Literal(last)) => last.extend_from_slice(bytes),
            _ => self.rules.push(TemplateRule::Literal(bytes.to_vec())),
        }
    }

    /// Push a character given by value; text templates encode it as UTF-8
    fn push_char(&mut self, value: u32, text_mode: bool) {
        if text_mode {
            let c = char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER);
            let mut buf = [0; 4];
            self.push_literal(c.encode_utf8(&mut buf).as_bytes());
        } else {
            // octal escapes never exceed 0o377
            self.push_literal(&[value as u8]);
        }
    }

    fn push_group(&mut self, gid: usize, groups: usize) -> Result<()> {
        if gid > groups {
            return Err(template_error(format!("invalid group reference {}", gid)));
        }
        self.rules.push(TemplateRule::Group(gid));
        Ok(())
    }
}

/// Compile a template; see [`Template::parse`]
pub fn parse_template(engine: &dyn Engine, template: &[u8], text_mode: bool) -> Result<Template> {
    Template::parse(engine, template, text_mode)
}

/// Replace up to `count` matches (0 for all) and return the new text with
/// the number of replacements made
pub fn substitute(engine: &dyn Engine, template: &Template, text: &[u8], count: usize) -> Result<(Vec<u8>, usize)> {
    let mut out = Vec::with_capacity(text.len());
    let mut last = 0;
    let mut replaced = 0;
    for m in Finder::new(engine, text, 0).limit(count) {
        let m = m?;
        out.extend_from_slice(&text[last..m.start]);
        template.expand(&m, text, &mut out);
        last = m.end;
        replaced += 1;
    }
    out.extend_from_slice(&text[last..]);
    Ok((out, replaced))
}

fn template_error(msg: impl Into<String>) -> RegexError {
    RegexError::Template(msg.into())
}

/// Parse the `<name>` after `\g`, returning the group number and the rest
fn group_reference<'t>(engine: &dyn Engine, rest: &'t [u8], text_mode: bool) -> Result<(usize, &'t [u8])> {
    let Some(body) = rest.strip_prefix(b"<") else {
        return Err(template_error("missing <"));
    };
    let close = body.iter().position(|&b| b == b'>');
    let raw = &body[..close.unwrap_or(body.len())];
    if raw.is_empty() {
        return Err(template_error("missing group name"));
    }
    let Some(close) = close else {
        return Err(template_error("missing >, unterminated name"));
    };

    let name: String = if text_mode {
        String::from_utf8_lossy(raw).into_owned()
    } else {
        raw.iter().map(|&b| char::from(b)).collect()
    };

    let gid = if name.bytes().all(|b| b.is_ascii_digit()) {
        let gid = name.bytes().fold(0usize, |acc, b| {
            acc.saturating_mul(10).saturating_add(usize::from(b - b'0'))
        });
        if gid >= MAXGROUPS {
            return Err(template_error(format!("invalid group reference {}", gid)));
        }
        gid
    } else {
        if (!text_mode && !name.is_ascii()) || !is_identifier(&name) {
            return Err(template_error(format!(
                "bad character in group name {}",
                quote(&name, text_mode)
            )));
        }
        engine.subexp_index(&name).ok_or_else(|| {
            template_error(format!("unknown group name {}", quote(&name, text_mode)))
        })?
    };

    Ok((gid, &body[close + 1..]))
}

fn unescape(c: u8) -> Option<u8> {
    match c {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0b),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}

fn is_oct_digit(b: u8) -> bool {
    (b'0'..=b'7').contains(&b)
}

fn octal_prefix(bytes: &[u8], max: usize) -> usize {
    bytes.iter().take(max).take_while(|&&b| is_oct_digit(b)).count()
}

fn octal_value(digits: &[u8]) -> u32 {
    digits
        .iter()
        .fold(0, |acc, &d| acc * 8 + u32::from(d - b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use crate::flags::Flags;

    fn engine(pattern: &str) -> Box<dyn Engine> {
        compile(pattern.as_bytes(), true, Flags::empty(), true).unwrap()
    }

    fn rules(pattern: &str, template: &str) -> Vec<TemplateRule> {
        Template::parse(engine(pattern).as_ref(), template.as_bytes(), true)
            .unwrap()
            .rules()
            .to_vec()
    }

    fn error(pattern: &str, template: &str) -> String {
        Template::parse(engine(pattern).as_ref(), template.as_bytes(), true)
            .unwrap_err()
            .to_string()
    }

    fn lit(s: &str) -> TemplateRule {
        TemplateRule::Literal(s.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(rules("a", "hello"), vec![lit("hello")]);
        assert_eq!(rules("a", ""), vec![]);
    }

    #[test]
    fn test_parse_group_references() {
        assert_eq!(
            rules("(a)(?P<x>b)", "x\\g<1>y\\g<x>\\2z"),
            vec![
                lit("x"),
                TemplateRule::Group(1),
                lit("y"),
                TemplateRule::Group(2),
                TemplateRule::Group(2),
                lit("z"),
            ]
        );
        assert_eq!(rules("a", "\\g<0>"), vec![TemplateRule::Group(0)]);
    }

    #[test]
    fn test_two_digit_group() {
        let pattern = "(a)".repeat(12);
        assert_eq!(rules(&pattern, "\\12"), vec![TemplateRule::Group(12)]);
        assert_eq!(rules(&pattern, "\\1a"), vec![TemplateRule::Group(1), lit("a")]);
    }

    #[test]
    fn test_escapes_are_merged() {
        assert_eq!(rules("a", "a\\n\\tb"), vec![lit("a\n\tb")]);
        assert_eq!(rules("a", "\\-\\\\"), vec![lit("\\-\\")]);
        assert_eq!(rules("a", "\\b"), vec![lit("\x08")]);
    }

    #[test]
    fn test_octal_escapes() {
        assert_eq!(rules("a", "\\0"), vec![lit("\0")]);
        assert_eq!(rules("a", "\\08"), vec![lit("\08")]);
        assert_eq!(rules("a", "\\101"), vec![lit("A")]);
        assert_eq!(rules("a", "\\141\\0101"), vec![lit("a\x081")]);
        assert_eq!(rules("a", "\\377"), vec![lit("\u{ff}")]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(error("a", "\\"), "bad escape (end of pattern)");
        assert_eq!(error("a", "\\q"), "bad escape \\q");
        assert_eq!(error("a", "\\g"), "missing <");
        assert_eq!(error("a", "\\g<>"), "missing group name");
        assert_eq!(error("a", "\\g<a"), "missing >, unterminated name");
        assert_eq!(error("a", "\\g<a-b>"), "bad character in group name 'a-b'");
        assert_eq!(error("a", "\\g<x>"), "unknown group name 'x'");
        assert_eq!(error("a", "\\g<2>"), "invalid group reference 2");
        assert_eq!(error("a", "\\1"), "invalid group reference 1");
        assert_eq!(error("a", "\\400"), "octal escape value \\400 outside of range 0-0o377");
    }

    #[test]
    fn test_bytes_template() {
        let engine = compile(b"(a)", false, Flags::empty(), true).unwrap();
        let template = Template::parse(engine.as_ref(), b"\\377\\1", false).unwrap();
        assert_eq!(
            template.rules(),
            [TemplateRule::Literal(vec![0xff]), TemplateRule::Group(1)]
        );
        let err = Template::parse(engine.as_ref(), b"\\g<\xe9>", false).unwrap_err();
        assert_eq!(err.to_string(), "bad character in group name '\\xe9'");
    }

    #[test]
    fn test_expand() {
        let engine = engine("(a)(x)?");
        let template = Template::parse(engine.as_ref(), b"[\\1|\\2]", true).unwrap();
        let text = b"ba";
        let m = crate::finder::find_match(engine.as_ref(), text, 0, false)
            .unwrap()
            .unwrap();
        let mut out = Vec::new();
        template.expand(&m, text, &mut out);
        assert_eq!(out, b"[a|]");
    }

    #[test]
    fn test_substitute() {
        let engine = engine("(\\w+)@(\\w+)");
        let template = Template::parse(engine.as_ref(), b"\\2 at \\g<1>", true).unwrap();
        let (out, n) = substitute(engine.as_ref(), &template, b"me@home, you@work", 0).unwrap();
        assert_eq!(out, b"home at me, work at you");
        assert_eq!(n, 2);

        let (out, n) = substitute(engine.as_ref(), &template, b"me@home, you@work", 1).unwrap();
        assert_eq!(out, b"home at me, you@work");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_substitute_every_match() {
        let engine = engine("|a");
        let template = Template::parse(engine.as_ref(), b"-", true).unwrap();
        let (out, n) = substitute(engine.as_ref(), &template, b"aa", 0).unwrap();
        assert_eq!(out, b"-----");
        assert_eq!(n, 5);
    }

    #[test]
    fn test_as_literal() {
        let engine = engine("a");
        let template = Template::parse(engine.as_ref(), b"x\\ny", true).unwrap();
        assert_eq!(template.as_literal(), Some(&b"x\ny"[..]));
    }
}
