//! Accessibility-style snapshot trees
//!
//! [`SnapshotNode`] is the tree a snapshot producer reports for a page,
//! [`ExpectedSnapshot`] is a parsed template, and [`compare`] checks one
//! against the other, stopping at the first mismatch.

mod compare;
mod node;
mod producer;
mod render;
mod template;

pub use compare::{compare, compare_text, MatchResult};
pub use node::{SnapshotNode, DOCUMENT_ROLE, TEXT_ROLE};
pub use producer::{SnapshotProducer, StaticPage};
pub use render::{render, RenderOptions};
pub use template::{ChildrenMode, ExpectedNode, ExpectedSnapshot, TextMatcher};
