//! Selector parsing and per-element matching.
//!
//! Covers the subset of CSS selector syntax the passes actually use: comma
//! lists, descendant chains, and compound selectors built from a tag name,
//! `#id`, `.class`, `[attr]`, `[attr="value"]` and `[attr*="value" i]`.
//! Anything outside that subset is rejected up front rather than silently
//! matching nothing.

use std::fmt;

use tracing::instrument;

use crate::domain::dom::ElementData;
use crate::domain::error::{DomainError, DomainResult};

/// Attribute test inside `[...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr="value"]`
    Equals,
    /// `[attr*="value"]`
    Contains,
}

/// One simple condition within a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Id(String),
    Class(String),
    Attr {
        name: String,
        op: AttrOp,
        value: String,
        case_insensitive: bool,
    },
}

/// A compound selector: optional tag name plus zero or more conditions,
/// all of which must hold on a single element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound {
    pub tag: Option<String>,
    pub conditions: Vec<Condition>,
}

impl Compound {
    /// Test this compound against a single element's data.
    pub fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(&element.tag) {
                return false;
            }
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => element.attr("id") == Some(id.as_str()),
            Condition::Class(class) => element.has_class(class),
            Condition::Attr {
                name,
                op,
                value,
                case_insensitive,
            } => {
                let Some(actual) = element.attr(name) else {
                    return false;
                };
                match op {
                    AttrOp::Exists => true,
                    AttrOp::Equals => {
                        if *case_insensitive {
                            actual.eq_ignore_ascii_case(value)
                        } else {
                            actual == value
                        }
                    }
                    AttrOp::Contains => {
                        if *case_insensitive {
                            actual.to_ascii_lowercase().contains(&value.to_ascii_lowercase())
                        } else {
                            actual.contains(value.as_str())
                        }
                    }
                }
            }
        })
    }

    fn is_bare(&self) -> bool {
        self.tag.is_none() && self.conditions.is_empty()
    }
}

/// A single selector: a descendant chain of compounds. The last compound is
/// the target, the preceding ones must match strict ancestors in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Compound the matched element itself must satisfy.
    pub fn target(&self) -> &Compound {
        // parts is never empty by construction
        self.parts.last().unwrap()
    }

    /// Compounds that must match ancestors, outermost first.
    pub fn ancestors(&self) -> &[Compound] {
        &self.parts[..self.parts.len() - 1]
    }
}

/// A parsed comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse a comma-separated selector list.
#[instrument(level = "trace")]
pub fn parse_selector_list(input: &str) -> DomainResult<SelectorList> {
    let mut selectors = Vec::new();
    for raw in split_top_level(input, ',') {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(invalid(input, "empty selector in list"));
        }
        selectors.push(parse_selector(input, raw)?);
    }
    if selectors.is_empty() {
        return Err(invalid(input, "empty selector list"));
    }
    Ok(SelectorList {
        source: input.trim().to_string(),
        selectors,
    })
}

fn parse_selector(source: &str, raw: &str) -> DomainResult<Selector> {
    let mut parts = Vec::new();
    for token in split_top_level(raw, ' ') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token == ">" || token == "+" || token == "~" {
            return Err(invalid(source, "combinators other than descendant are not supported"));
        }
        let compound = parse_compound(source, token)?;
        if compound.is_bare() {
            return Err(invalid(source, "selector part matches nothing"));
        }
        parts.push(compound);
    }
    if parts.is_empty() {
        return Err(invalid(source, "empty selector"));
    }
    Ok(Selector { parts })
}

fn parse_compound(source: &str, token: &str) -> DomainResult<Compound> {
    let chars: Vec<char> = token.chars().collect();
    let mut pos = 0;
    let mut compound = Compound::default();

    if pos < chars.len() && chars[pos] == '*' {
        pos += 1;
    } else if pos < chars.len() && is_ident_start(chars[pos]) {
        let tag = take_ident(&chars, &mut pos);
        compound.tag = Some(tag.to_ascii_lowercase());
    }

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                pos += 1;
                let id = take_ident(&chars, &mut pos);
                if id.is_empty() {
                    return Err(invalid(source, "missing id after '#'"));
                }
                compound.conditions.push(Condition::Id(id));
            }
            '.' => {
                pos += 1;
                let class = take_ident(&chars, &mut pos);
                if class.is_empty() {
                    return Err(invalid(source, "missing class after '.'"));
                }
                compound.conditions.push(Condition::Class(class));
            }
            '[' => {
                pos += 1;
                compound.conditions.push(parse_attr(source, &chars, &mut pos)?);
            }
            other => {
                return Err(invalid(source, &format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(compound)
}

fn parse_attr(source: &str, chars: &[char], pos: &mut usize) -> DomainResult<Condition> {
    skip_spaces(chars, pos);
    let name = take_ident(chars, pos);
    if name.is_empty() {
        return Err(invalid(source, "missing attribute name"));
    }
    skip_spaces(chars, pos);

    let op = if chars.get(*pos) == Some(&'*') && chars.get(*pos + 1) == Some(&'=') {
        *pos += 2;
        AttrOp::Contains
    } else if chars.get(*pos) == Some(&'=') {
        *pos += 1;
        AttrOp::Equals
    } else {
        AttrOp::Exists
    };

    let mut value = String::new();
    let mut case_insensitive = false;

    if op != AttrOp::Exists {
        skip_spaces(chars, pos);
        match chars.get(*pos) {
            Some(&quote @ ('"' | '\'')) => {
                *pos += 1;
                while let Some(&c) = chars.get(*pos) {
                    if c == quote {
                        break;
                    }
                    value.push(c);
                    *pos += 1;
                }
                if chars.get(*pos) != Some(&quote) {
                    return Err(invalid(source, "unterminated attribute value"));
                }
                *pos += 1;
            }
            Some(_) => {
                while let Some(&c) = chars.get(*pos) {
                    if c == ']' || c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    *pos += 1;
                }
            }
            None => return Err(invalid(source, "missing attribute value")),
        }
    }

    skip_spaces(chars, pos);
    if matches!(chars.get(*pos), Some('i' | 'I')) && chars.get(*pos + 1) == Some(&']') {
        case_insensitive = true;
        *pos += 1;
        skip_spaces(chars, pos);
    }

    if chars.get(*pos) != Some(&']') {
        return Err(invalid(source, "missing ']' in attribute selector"));
    }
    *pos += 1;

    Ok(Condition::Attr {
        name: name.to_ascii_lowercase(),
        op,
        value,
        case_insensitive,
    })
}

/// Split on `sep` at bracket/quote depth zero so attribute selectors keep
/// their embedded spaces and commas.
fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;
    let mut bracket_depth = 0usize;

    for c in input.chars() {
        match in_quote {
            Some(quote) => {
                current.push(c);
                if c == quote {
                    in_quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    in_quote = Some(c);
                    current.push(c);
                }
                '[' => {
                    bracket_depth += 1;
                    current.push(c);
                }
                ']' => {
                    bracket_depth = bracket_depth.saturating_sub(1);
                    current.push(c);
                }
                _ if bracket_depth == 0 && matches_sep(c, sep) => {
                    parts.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    parts.push(current);
    parts
}

fn matches_sep(c: char, sep: char) -> bool {
    if sep == ' ' {
        c.is_whitespace()
    } else {
        c == sep
    }
}

fn take_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while let Some(&c) = chars.get(*pos) {
        if is_ident_char(c) {
            *pos += 1;
        } else {
            break;
        }
    }
    chars[start..*pos].iter().collect()
}

fn skip_spaces(chars: &[char], pos: &mut usize) {
    while chars.get(*pos).is_some_and(|c| c.is_whitespace()) {
        *pos += 1;
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn invalid(selector: &str, reason: &str) -> DomainError {
    DomainError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}
