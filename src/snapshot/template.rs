//! Expected snapshot templates
//!
//! Templates are YAML sequences. Each item is either a bare header or a
//! single-key mapping from header to value:
//!
//! ```text
//! - navigation:
//!   - list:
//!     - /children: equal
//!     - listitem: Feature A
//!     - listitem:
//!       - link "Feature B":
//!         - /url: https://playwright.dev
//! - heading "Welcome" [level=1]
//! - link /About.*/
//! - text: Copyright 2023
//! ```
//!
//! A header is `role`, then an optional quoted name or `/regex/`, then any
//! number of `[key=value]` attributes. A scalar value is the node's inline
//! text; a sequence value lists its children. Items whose key starts with
//! `/` are properties of the enclosing node.

use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::common::{Error, Result};

use super::node::{normalize_whitespace, SnapshotNode, TEXT_ROLE};

/// Reserved property controlling how children are compared
const CHILDREN_PROPERTY: &str = "/children";

/// Attribute carrying element references in rendered snapshots; never matched
const REF_ATTRIBUTE: &str = "ref";

/// Name or text expectation
#[derive(Debug, Clone)]
pub enum TextMatcher {
    Exact(String),
    /// Written `/pattern/`; matches anywhere in the value
    Pattern(Regex),
}

impl TextMatcher {
    /// Interpret a template value, treating `/.../` as a pattern
    pub fn parse(value: &str) -> Result<Self> {
        match value.strip_prefix('/').and_then(|v| v.strip_suffix('/')) {
            Some(pattern) if value.len() >= 2 => {
                let pattern = pattern.replace("\\/", "/");
                Regex::new(&pattern)
                    .map(Self::Pattern)
                    .map_err(|e| Error::snapshot_parse(value, format!("invalid pattern: {}", e)))
            }
            _ => Ok(Self::Exact(value.to_string())),
        }
    }

    /// Match a name exactly (case-sensitive)
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == value,
            Self::Pattern(re) => re.is_match(value),
        }
    }

    /// Match visible text, collapsing whitespace on both sides
    pub fn matches_text(&self, value: &str) -> bool {
        match self {
            Self::Exact(expected) => normalize_whitespace(expected) == normalize_whitespace(value),
            Self::Pattern(re) => re.is_match(value),
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }
}

impl PartialEq for TextMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{}", s),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

/// How the children of an expected node are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildrenMode {
    /// Expected child `i` against actual child `i`; trailing actual children are ignored
    #[default]
    Positional,
    /// Same number of children, matched in any order
    Equal,
}

/// One node of an expected snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpectedNode {
    /// `None` for a text-only node
    pub role: Option<String>,
    pub name: Option<TextMatcher>,
    /// Inline text, compared against the flattened text of the actual node
    pub text: Option<TextMatcher>,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<ExpectedNode>,
    pub children_mode: ChildrenMode,
}

impl ExpectedNode {
    pub fn element(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::default()
        }
    }

    pub fn text_only(text: TextMatcher) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    /// Breadcrumb label: the role, or `text` for text-only nodes
    pub fn label(&self) -> &str {
        self.role.as_deref().unwrap_or(TEXT_ROLE)
    }

    /// One-line description used in mismatch reports
    pub fn describe(&self) -> String {
        let mut out = self.label().to_string();
        if let Some(name) = &self.name {
            match name {
                TextMatcher::Exact(s) => out.push_str(&format!(" \"{}\"", s)),
                TextMatcher::Pattern(_) => out.push_str(&format!(" {}", name)),
            }
        }
        for (key, value) in &self.attributes {
            out.push_str(&format!(" [{}={}]", key, value));
        }
        if let Some(text) = &self.text {
            out.push_str(&format!(": {}", text));
        }
        out
    }

    /// Convert to an actual node; fails when the template uses patterns
    pub fn to_node(&self) -> Result<SnapshotNode> {
        let exact = |m: &TextMatcher| match m {
            TextMatcher::Exact(s) => Ok(s.clone()),
            TextMatcher::Pattern(_) => Err(Error::snapshot_parse(
                &self.describe(),
                "patterns are not allowed in a concrete snapshot",
            )),
        };

        let Some(role) = &self.role else {
            let text = self.text.as_ref().map(exact).transpose()?.unwrap_or_default();
            return Ok(SnapshotNode::text(text));
        };

        let mut node = SnapshotNode::new(role.clone());
        node.name = self.name.as_ref().map(exact).transpose()?;
        node.attributes = self.attributes.clone();
        if let Some(text) = &self.text {
            node.children.push(SnapshotNode::text(exact(text)?));
        }
        for child in &self.children {
            node.children.push(child.to_node()?);
        }
        Ok(node)
    }
}

/// Parsed template used as the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpectedSnapshot {
    pub roots: Vec<ExpectedNode>,
}

impl ExpectedSnapshot {
    /// Parse template text
    ///
    /// Leading indentation shared by all lines is removed first, so
    /// templates can be embedded indented inside other documents.
    pub fn parse(text: &str) -> Result<Self> {
        let source = dedent(text);
        if source.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(&source)
            .map_err(|e| Error::snapshot_parse(first_line(&source), e.to_string()))?;

        let items = match value {
            Value::Null => return Ok(Self::default()),
            Value::Sequence(items) => items,
            _ => {
                return Err(Error::snapshot_parse(
                    first_line(&source),
                    "template must be a list of '- role' items",
                ))
            }
        };

        let mut roots = Vec::with_capacity(items.len());
        for item in &items {
            match parse_item(item)? {
                Item::Node(node) => roots.push(node),
                Item::Property(key, _) => {
                    return Err(Error::snapshot_parse(
                        &key,
                        "properties must belong to a node",
                    ))
                }
            }
        }
        Ok(Self { roots })
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

enum Item {
    Node(ExpectedNode),
    Property(String, String),
}

fn parse_item(item: &Value) -> Result<Item> {
    match item {
        Value::String(header) => Ok(Item::Node(text_only_if_bare(parse_header(header)?))),
        Value::Mapping(map) if map.len() == 1 => {
            let Some((key, value)) = map.iter().next() else {
                return Err(Error::Internal("empty template mapping".to_string()));
            };
            let key = scalar_to_string(key)
                .ok_or_else(|| Error::snapshot_parse(&format!("{:?}", key), "expected a header"))?;

            if key.starts_with('/') {
                let value = scalar_to_string(value).ok_or_else(|| {
                    Error::snapshot_parse(&key, "property value must be a scalar")
                })?;
                return Ok(Item::Property(key, value));
            }

            let mut node = parse_header(&key)?;
            match value {
                Value::Null => {}
                Value::Sequence(children) => {
                    for child in children {
                        match parse_item(child)? {
                            Item::Node(child) => node.children.push(child),
                            Item::Property(prop, value) => apply_property(&mut node, prop, value)?,
                        }
                    }
                }
                scalar => {
                    let text = scalar_to_string(scalar).ok_or_else(|| {
                        Error::snapshot_parse(&key, "value must be text or a list of children")
                    })?;
                    node.text = Some(TextMatcher::parse(&text)?);
                }
            }

            Ok(Item::Node(text_only_if_bare(node)))
        }
        Value::Mapping(_) => Err(Error::snapshot_parse(
            &format!("{:?}", item),
            "each item must have exactly one header",
        )),
        other => Err(Error::snapshot_parse(
            &format!("{:?}", other),
            "expected a header",
        )),
    }
}

/// `- text`, `- text:` and `- text: foo` are text-only nodes
fn text_only_if_bare(mut node: ExpectedNode) -> ExpectedNode {
    if node.role.as_deref() == Some(TEXT_ROLE) && node.name.is_none() {
        node.role = None;
    }
    node
}

fn apply_property(node: &mut ExpectedNode, key: String, value: String) -> Result<()> {
    if key == CHILDREN_PROPERTY {
        node.children_mode = match value.as_str() {
            "equal" => ChildrenMode::Equal,
            other => {
                return Err(Error::snapshot_parse(
                    &key,
                    format!("unsupported children mode '{}'", other),
                ))
            }
        };
    } else {
        node.attributes.insert(key, value);
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse `role ["name" | /pattern/] [key=value]*`
fn parse_header(header: &str) -> Result<ExpectedNode> {
    let trimmed = header.trim();
    let role_end = trimmed
        .find(|c: char| c.is_whitespace() || c == '[' || c == '"' || c == '/')
        .unwrap_or(trimmed.len());
    let role = &trimmed[..role_end];
    if role.is_empty() {
        return Err(Error::snapshot_parse(header, "missing role"));
    }

    let mut node = ExpectedNode::element(role);
    let mut rest = trimmed[role_end..].chars().peekable();

    while let Some(&c) = rest.peek() {
        match c {
            c if c.is_whitespace() => {
                rest.next();
            }
            '"' | '/' => {
                if node.name.is_some() {
                    return Err(Error::snapshot_parse(header, "node has more than one name"));
                }
                rest.next();
                let body = read_delimited(&mut rest, c)
                    .ok_or_else(|| Error::snapshot_parse(header, "unterminated name"))?;
                node.name = Some(if c == '"' {
                    TextMatcher::Exact(body)
                } else {
                    TextMatcher::parse(&format!("/{}/", body))?
                });
            }
            '[' => {
                rest.next();
                let (key, value) = read_attribute(&mut rest)
                    .ok_or_else(|| Error::snapshot_parse(header, "unterminated attribute"))?;
                if key.is_empty() {
                    return Err(Error::snapshot_parse(header, "empty attribute"));
                }
                if key != REF_ATTRIBUTE {
                    node.attributes.insert(key, value);
                }
            }
            other => {
                return Err(Error::snapshot_parse(
                    header,
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }

    Ok(node)
}

/// Read `key=value]`, `key="value"]` or `key]` after an opening bracket
///
/// Bare values are trimmed; quoted values are kept as written.
fn read_attribute(
    chars: &mut std::iter::Peekable<impl Iterator<Item = char>>,
) -> Option<(String, String)> {
    let mut key = String::new();
    loop {
        match chars.next()? {
            ']' => return Some((key.trim().to_string(), "true".to_string())),
            '=' => break,
            c => key.push(c),
        }
    }

    while chars.next_if(|c| c.is_whitespace()).is_some() {}

    let value = if chars.next_if_eq(&'"').is_some() {
        let value = read_delimited(chars, '"')?;
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next()? != ']' {
            return None;
        }
        value
    } else {
        let mut value = String::new();
        loop {
            match chars.next()? {
                ']' => break,
                c => value.push(c),
            }
        }
        value.trim().to_string()
    };
    Some((key.trim().to_string(), value))
}

/// Read up to the closing delimiter
///
/// Inside quotes `\"`, `\\`, `\n` and `\t` are unescaped. Inside a pattern
/// escapes are kept as written except `\/`.
fn read_delimited(chars: &mut impl Iterator<Item = char>, delimiter: char) -> Option<String> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        if c == delimiter {
            return Some(out);
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match (delimiter, escaped) {
            ('"', 'n') => out.push('\n'),
            ('"', 't') => out.push('\t'),
            ('"', other) => out.push(other),
            (_, '/') => out.push('/'),
            (_, other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    None
}

fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_line(text: &str) -> &str {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim()
}
