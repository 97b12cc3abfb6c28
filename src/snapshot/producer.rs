//! Snapshot producers
//!
//! Computing an accessibility tree from a live page is outside this crate;
//! producers hand over finished [`SnapshotNode`] trees.

use async_trait::async_trait;

use crate::common::{Error, Result};

use super::node::SnapshotNode;

#[async_trait]
pub trait SnapshotProducer: Send + Sync {
    /// Snapshot the subtree rooted at the first node with role `locator`,
    /// or the whole page when `locator` is `None`
    async fn snapshot(&self, locator: Option<&str>) -> Result<SnapshotNode>;
}

/// Producer backed by a fixed tree, used by scenario files and tests
#[derive(Debug, Clone)]
pub struct StaticPage {
    root: SnapshotNode,
}

impl StaticPage {
    pub fn new(root: SnapshotNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SnapshotNode {
        &self.root
    }
}

#[async_trait]
impl SnapshotProducer for StaticPage {
    async fn snapshot(&self, locator: Option<&str>) -> Result<SnapshotNode> {
        let Some(role) = locator else {
            return Ok(self.root.clone());
        };
        find_role(&self.root, role)
            .cloned()
            .ok_or_else(|| Error::action(format!("No element with role '{}' on the page", role)))
    }
}

/// Depth-first search for the first node with `role`
fn find_role<'a>(node: &'a SnapshotNode, role: &str) -> Option<&'a SnapshotNode> {
    if node.role == role {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_role(child, role))
}
