//! Minimal CSS selector matching for element snapshots.
//!
//! Supported: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! `[attr^=value]`, `[attr*=value]`, compounds of those (`pre.code`), and
//! comma-separated lists. Combinators are not supported; ancestry is handled
//! by the caller walking the ancestor chain.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::ElementSnapshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported character `{0}` in selector `{1}`")]
    Unsupported(char, String),
    #[error("unterminated attribute selector in `{0}`")]
    UnterminatedAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    op: AttrOp,
}

impl AttrMatch {
    fn matches(&self, element: &ElementSnapshot) -> bool {
        let Some(value) = element.attr(&self.name) else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Prefix(v) => value.starts_with(v.as_str()),
            AttrOp::Contains(v) => value.contains(v.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, element: &ElementSnapshot) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(&element.tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.attr("id") != Some(id.as_str())
        {
            return false;
        }
        if !self
            .classes
            .iter()
            .all(|c| element.classes().any(|ec| ec == c))
        {
            return false;
        }
        self.attrs.iter().all(|a| a.matches(element))
    }
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let compounds = source
            .split(',')
            .map(|part| parse_compound(part.trim(), source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.trim().to_string(),
            compounds,
        })
    }

    pub fn matches(&self, element: &ElementSnapshot) -> bool {
        self.compounds.iter().any(|c| c.matches(element))
    }

    pub fn as_str(&self) -> &str {
        &self.source
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

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')
}

fn take_name(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_name_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(part: &str, full: &str) -> Result<Compound, SelectorError> {
    if part.is_empty() {
        return Err(SelectorError::Empty);
    }

    let chars: Vec<char> = part.chars().collect();
    let mut compound = Compound::default();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if i == 0 => i += 1,
            '#' => {
                let (name, next) = take_name(&chars, i + 1);
                if name.is_empty() {
                    return Err(SelectorError::Unsupported('#', full.to_string()));
                }
                compound.id = Some(name);
                i = next;
            }
            '.' => {
                let (name, next) = take_name(&chars, i + 1);
                if name.is_empty() {
                    return Err(SelectorError::Unsupported('.', full.to_string()));
                }
                compound.classes.push(name);
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|p| i + p)
                    .ok_or_else(|| SelectorError::UnterminatedAttribute(full.to_string()))?;
                let inner: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(parse_attr(&inner));
                i = close + 1;
            }
            c if c.is_ascii_alphabetic() && i == 0 => {
                let (name, next) = take_name(&chars, i);
                compound.tag = Some(name.to_ascii_lowercase());
                i = next;
            }
            c => return Err(SelectorError::Unsupported(c, full.to_string())),
        }
    }

    Ok(compound)
}

fn parse_attr(inner: &str) -> AttrMatch {
    // The first `=` ends the name; the byte before it picks the operator
    let Some(eq) = inner.find('=') else {
        return AttrMatch {
            name: inner.trim().to_ascii_lowercase(),
            op: AttrOp::Exists,
        };
    };

    let value = inner[eq + 1..].trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    let (name, op) = match inner[..eq].as_bytes().last() {
        Some(b'^') => (&inner[..eq - 1], AttrOp::Prefix(value)),
        Some(b'*') => (&inner[..eq - 1], AttrOp::Contains(value)),
        _ => (&inner[..eq], AttrOp::Equals(value)),
    };

    AttrMatch {
        name: name.trim().to_ascii_lowercase(),
        op,
    }
}
