//! Actual snapshot tree as produced by a snapshot producer

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::common::{Error, Result};

use super::template::ExpectedSnapshot;

/// Role carried by text leaves
pub const TEXT_ROLE: &str = "text";

/// Role of the synthetic root wrapping multi-root snapshot text
pub const DOCUMENT_ROLE: &str = "document";

/// One node of an accessibility-like tree
///
/// Text content lives in leaves with role [`TEXT_ROLE`] whose `name` holds
/// the text. Attribute keys starting with `/` (such as `/url`) are rendered
/// as property lines, all others in brackets after the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Create a text leaf
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            name: Some(content.into()),
            ..Self::new(TEXT_ROLE)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SnapshotNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a text leaf
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.with_child(Self::text(content))
    }

    pub fn is_text(&self) -> bool {
        self.role == TEXT_ROLE
    }

    /// Visible text of this subtree: all text leaves in document order,
    /// joined by single spaces with whitespace runs collapsed
    pub fn flattened_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        normalize_whitespace(&parts.join(" "))
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        if self.is_text() {
            if let Some(text) = &self.name {
                parts.push(text);
            }
            return;
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }

    /// Build an actual tree from snapshot text
    ///
    /// A single top-level item becomes the root; several are wrapped in a
    /// [`DOCUMENT_ROLE`] node. Name or text patterns are rejected since an
    /// actual tree has concrete values only.
    pub fn parse_snapshot(text: &str) -> Result<Self> {
        let expected = ExpectedSnapshot::parse(text)?;
        let mut roots = expected
            .roots
            .iter()
            .map(|root| root.to_node())
            .collect::<Result<Vec<_>>>()?;

        match roots.len() {
            0 => Err(Error::snapshot_parse(text.trim(), "snapshot has no nodes")),
            1 => Ok(roots.remove(0)),
            _ => Ok(Self::new(DOCUMENT_ROLE).with_children(roots)),
        }
    }
}

pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_text_collects_descendants() {
        let node = SnapshotNode::new("listitem").with_child(
            SnapshotNode::new("link")
                .with_name("About Us")
                .with_text("About")
                .with_text("  Us "),
        );
        assert_eq!(node.flattened_text(), "About Us");
    }

    #[test]
    fn test_flattened_text_ignores_names() {
        let node = SnapshotNode::new("button").with_name("Save");
        assert_eq!(node.flattened_text(), "");
    }

    #[test]
    fn test_parse_snapshot_single_root() {
        let node = SnapshotNode::parse_snapshot(
            r#"
- list:
  - listitem: Home
  - listitem:
    - link "Products":
      - /url: https://example.com/products
"#,
        )
        .unwrap();

        assert_eq!(node.role, "list");
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].flattened_text(), "Home");
        let link = &node.children[1].children[0];
        assert_eq!(link.name.as_deref(), Some("Products"));
        assert_eq!(
            link.attributes.get("/url").map(String::as_str),
            Some("https://example.com/products")
        );
    }

    #[test]
    fn test_parse_snapshot_wraps_multiple_roots() {
        let node = SnapshotNode::parse_snapshot("- banner\n- main\n").unwrap();
        assert_eq!(node.role, DOCUMENT_ROLE);
        assert_eq!(node.children.len(), 2);
    }

    #[test]
    fn test_parse_snapshot_rejects_patterns() {
        let err = SnapshotNode::parse_snapshot("- link /About.*/").unwrap_err();
        assert!(matches!(err, Error::SnapshotParse { .. }));
    }

    #[test]
    fn test_serde_shape() {
        let node: SnapshotNode = serde_yaml::from_str(
            r#"
role: heading
name: Welcome
attributes:
  level: "1"
"#,
        )
        .unwrap();
        assert_eq!(node.role, "heading");
        assert!(node.children.is_empty());
        assert_eq!(node.attributes.get("level").map(String::as_str), Some("1"));
    }
}
