//! Triple type and the strict parser for LLM output.
//!
//! The model is asked to answer with one `('entity', 'relation', 'entity')`
//! literal per line. Lines are matched against a fixed grammar: a
//! parenthesised tuple of exactly three quoted strings, with an optional
//! trailing comma. Nothing is ever evaluated.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `(subject, relation, object)` fact extracted from text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            quote(&self.subject),
            quote(&self.relation),
            quote(&self.object)
        )
    }
}

impl<S, R, O> From<(S, R, O)> for Triple
where
    S: Into<String>,
    R: Into<String>,
    O: Into<String>,
{
    fn from((subject, relation, object): (S, R, O)) -> Self {
        Self::new(subject, relation, object)
    }
}

/// Result of parsing one LLM response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTriples {
    /// Accepted triples, in line order
    pub triples: Vec<Triple>,
    /// Non-empty lines that did not match the triple grammar
    pub discarded: usize,
}

static TRIPLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let literal = r#"('(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*")"#;
    let pattern = format!(r"^\(\s*{literal}\s*,\s*{literal}\s*,\s*{literal}\s*,?\s*\)$");
    Regex::new(&pattern).expect("triple grammar must compile")
});

/// Parse LLM output into triples, dropping anything that is not a 3-tuple of strings.
pub fn parse_triples(output: &str) -> Vec<Triple> {
    parse_triples_detailed(output).triples
}

/// Same as [`parse_triples`] but also reports how many lines were dropped.
pub fn parse_triples_detailed(output: &str) -> ParsedTriples {
    let mut parsed = ParsedTriples::default();

    for line in output.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Some(triple) => parsed.triples.push(triple),
            None => parsed.discarded += 1,
        }
    }

    parsed
}

fn parse_line(line: &str) -> Option<Triple> {
    let caps = TRIPLE_LINE.captures(line)?;
    let field = |idx: usize| caps.get(idx).and_then(|m| unquote(m.as_str()));

    Some(Triple {
        subject: field(1)?,
        relation: field(2)?,
        object: field(3)?,
    })
}

/// Strip the surrounding quotes and resolve backslash escapes.
///
/// Escapes follow Python string literals. `None` for a malformed `\x`,
/// `\u` or `\U` escape, or one naming a surrogate.
fn unquote(literal: &str) -> Option<String> {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('v') => out.push('\u{0b}'),
            Some(escaped @ ('\\' | '\'' | '"')) => out.push(escaped),
            Some('x') => out.push(hex_escape(&mut chars, 2)?),
            Some('u') => out.push(hex_escape(&mut chars, 4)?),
            Some('U') => out.push(hex_escape(&mut chars, 8)?),
            Some(first @ '0'..='7') => out.push(octal_escape(first, &mut chars)?),
            // unknown escapes are kept verbatim
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    Some(out)
}

/// Exactly `digits` hex digits naming a code point.
fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let rest = chars.as_str();
    let hex = rest.get(..digits)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    *chars = rest[digits..].chars();
    char::from_u32(value)
}

/// Up to three octal digits, the first already consumed.
fn octal_escape(first: char, chars: &mut std::str::Chars<'_>) -> Option<char> {
    let mut value = first.to_digit(8)?;
    for _ in 0..2 {
        let rest = chars.as_str();
        match rest.chars().next().and_then(|c| c.to_digit(8)) {
            Some(digit) => {
                value = value * 8 + digit;
                *chars = rest[1..].chars();
            }
            None => break,
        }
    }
    char::from_u32(value)
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
