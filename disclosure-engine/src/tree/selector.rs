//! A small CSS selector subset for locating tiles and anchors.
//!
//! Supported: type selectors (`a`, `*`), `#id`, `.class`, `[attr]`,
//! `[attr=value]`, `[attr*=value]`, compounds of those (`input[data-appid]`)
//! and comma-separated lists. Combinators are rejected.

use std::fmt;
use std::str::FromStr;

use super::{DocumentTree, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unterminated attribute test in `{0}`")]
    Unterminated(String),

    #[error("Invalid name `{name}` in `{selector}`")]
    InvalidName { name: String, selector: String },

    #[error("Unsupported selector syntax: `{0}`")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
    Contains(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

/// Parsed selector list. A node matches if any alternative matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let alternatives = split_list(source)
            .into_iter()
            .map(|part| parse_compound(part, source))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Selector matching a single class name.
    pub fn class(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: format!(".{name}"),
            alternatives: vec![Compound {
                classes: vec![name],
                ..Default::default()
            }],
        }
    }

    /// Selector matching a single element id.
    pub fn id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            source: format!("#{id}"),
            alternatives: vec![Compound {
                id: Some(id),
                ..Default::default()
            }],
        }
    }

    /// Selector matching a tag name.
    pub fn tag(tag: impl Into<String>) -> Self {
        let tag = tag.into().to_ascii_lowercase();
        Self {
            source: tag.clone(),
            alternatives: vec![Compound {
                tag: Some(tag),
                ..Default::default()
            }],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches<D: DocumentTree + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        if !doc.is_live(node) {
            return false;
        }
        self.alternatives.iter().any(|c| compound_matches(c, doc, node))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn compound_matches<D: DocumentTree + ?Sized>(compound: &Compound, doc: &D, node: NodeId) -> bool {
    if let Some(tag) = &compound.tag {
        if doc.tag(node).as_deref() != Some(tag.as_str()) {
            return false;
        }
    }

    if let Some(id) = &compound.id {
        if doc.attribute(node, "id").as_deref() != Some(id.as_str()) {
            return false;
        }
    }

    if !compound.classes.iter().all(|c| doc.has_class(node, c)) {
        return false;
    }

    compound.attrs.iter().all(|test| match test {
        AttrTest::Exists(name) => doc.attribute(node, name).is_some(),
        AttrTest::Equals(name, value) => doc.attribute(node, name).as_deref() == Some(value.as_str()),
        AttrTest::Contains(name, value) => doc
            .attribute(node, name)
            .map(|v| v.contains(value.as_str()))
            .unwrap_or(false),
    })
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn check_name(name: &str, selector: &str) -> Result<(), SelectorError> {
    if is_name(name) {
        Ok(())
    } else {
        Err(SelectorError::InvalidName {
            name: name.to_string(),
            selector: selector.to_string(),
        })
    }
}

/// Split a selector list on commas outside attribute tests and quotes.
fn split_list(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;

    for (i, c) in source.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') if in_brackets => quote = Some(c),
            (None, '[') => in_brackets = true,
            (None, ']') => in_brackets = false,
            (None, ',') if !in_brackets => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn parse_compound(part: &str, full: &str) -> Result<Compound, SelectorError> {
    let part = part.trim();
    if part.is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut compound = Compound::default();
    let boundary = |c: char| matches!(c, '.' | '#' | '[');

    let tag_end = part.find(boundary).unwrap_or(part.len());
    let tag = &part[..tag_end];
    if !tag.is_empty() && tag != "*" {
        if tag.contains(char::is_whitespace) || tag.contains(|c: char| matches!(c, '>' | '+' | '~')) {
            return Err(SelectorError::Unsupported(full.to_string()));
        }
        check_name(tag, full)?;
        compound.tag = Some(tag.to_ascii_lowercase());
    }

    let mut rest = &part[tag_end..];
    while let Some(first) = rest.chars().next() {
        match first {
            '.' | '#' => {
                let body = &rest[1..];
                let end = body.find(boundary).unwrap_or(body.len());
                let name = &body[..end];
                if name.contains(char::is_whitespace) {
                    return Err(SelectorError::Unsupported(full.to_string()));
                }
                check_name(name, full)?;
                if first == '.' {
                    compound.classes.push(name.to_string());
                } else {
                    compound.id = Some(name.to_string());
                }
                rest = &body[end..];
            }
            '[' => {
                let close = rest
                    .find(']')
                    .ok_or_else(|| SelectorError::Unterminated(full.to_string()))?;
                compound.attrs.push(parse_attr(&rest[1..close], full)?);
                rest = &rest[close + 1..];
            }
            _ => return Err(SelectorError::Unsupported(full.to_string())),
        }
    }

    Ok(compound)
}

fn parse_attr(inner: &str, full: &str) -> Result<AttrTest, SelectorError> {
    let unquote = |v: &str| {
        let v = v.trim();
        let quoted = v.len() >= 2
            && ((v.starts_with('\'') && v.ends_with('\'')) || (v.starts_with('"') && v.ends_with('"')));
        if quoted {
            v[1..v.len() - 1].to_string()
        } else {
            v.to_string()
        }
    };

    if let Some((name, value)) = inner.split_once("*=") {
        let name = name.trim();
        check_name(name, full)?;
        return Ok(AttrTest::Contains(name.to_string(), unquote(value)));
    }

    if let Some((name, value)) = inner.split_once('=') {
        let name = name.trim();
        check_name(name, full)?;
        return Ok(AttrTest::Equals(name.to_string(), unquote(value)));
    }

    let name = inner.trim();
    check_name(name, full)?;
    Ok(AttrTest::Exists(name.to_string()))
}
