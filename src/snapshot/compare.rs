//! Snapshot comparison
//!
//! Comparison is top-down and stops at the first divergent subtree. The
//! breadcrumb path names the root by its role and every descendant as
//! `role[index]` relative to its parent.

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

use super::node::SnapshotNode;
use super::template::{ChildrenMode, ExpectedNode, ExpectedSnapshot};

/// Outcome of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub ok: bool,
    /// Breadcrumbs to the first mismatch; empty when `ok`
    pub path: Vec<String>,
    pub expected: String,
    pub actual: String,
}

impl MatchResult {
    pub fn matched() -> Self {
        Self {
            ok: true,
            path: Vec::new(),
            expected: String::new(),
            actual: String::new(),
        }
    }

    fn mismatch(path: &[String], expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            ok: false,
            path: path.to_vec(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Path formatted as `[navigation > list[0] > listitem[1]]`
    pub fn breadcrumbs(&self) -> String {
        format!("[{}]", self.path.join(" > "))
    }

    /// Turn a mismatch into [`Error::AssertionMismatch`]
    pub fn into_result(self) -> Result<()> {
        if self.ok {
            Ok(())
        } else {
            Err(Error::AssertionMismatch(Box::new(self)))
        }
    }
}

type Outcome = std::result::Result<(), MatchResult>;

/// Compare an actual tree against an expected snapshot
///
/// When the snapshot has a single root carrying the actual root's role the
/// two roots are compared directly. Otherwise the snapshot roots describe
/// the children of the actual root, so an empty snapshot matches only a
/// childless node.
pub fn compare(actual: &SnapshotNode, expected: &ExpectedSnapshot) -> MatchResult {
    let mut path = vec![actual.role.clone()];

    let outcome = match expected.roots.as_slice() {
        [root] if root.label() == actual.role => match_node(actual, root, &mut path),
        [] if !actual.children.is_empty() => Err(MatchResult::mismatch(
            &path,
            "no children",
            format!("{} children", actual.children.len()),
        )),
        roots => match_positional(&actual.children, roots, &mut path),
    };

    match outcome {
        Ok(()) => MatchResult::matched(),
        Err(mismatch) => mismatch,
    }
}

/// Convenience wrapper: parse the template, then compare
pub fn compare_text(actual: &SnapshotNode, template: &str) -> Result<MatchResult> {
    let expected = ExpectedSnapshot::parse(template)?;
    Ok(compare(actual, &expected))
}

fn match_node(actual: &SnapshotNode, expected: &ExpectedNode, path: &mut Vec<String>) -> Outcome {
    match &expected.role {
        Some(role) if *role != actual.role => {
            return Err(MatchResult::mismatch(path, role.as_str(), actual.role.as_str()));
        }
        _ => {}
    }

    if let Some(name) = &expected.name {
        let actual_name = actual.name.as_deref().unwrap_or("");
        if !name.matches(actual_name) {
            return Err(MatchResult::mismatch(path, name.to_string(), actual_name));
        }
    }

    for (key, value) in &expected.attributes {
        match actual.attributes.get(key) {
            Some(actual_value) if actual_value == value => {}
            Some(actual_value) => {
                return Err(MatchResult::mismatch(
                    path,
                    format!("{}={}", key, value),
                    format!("{}={}", key, actual_value),
                ));
            }
            None => {
                return Err(MatchResult::mismatch(
                    path,
                    format!("{}={}", key, value),
                    format!("no {} attribute", key),
                ));
            }
        }
    }

    if let Some(text) = &expected.text {
        let actual_text = actual.flattened_text();
        if !text.matches_text(&actual_text) {
            return Err(MatchResult::mismatch(path, text.to_string(), actual_text));
        }
    }

    match expected.children_mode {
        ChildrenMode::Positional => match_positional(&actual.children, &expected.children, path),
        ChildrenMode::Equal => match_unordered(&actual.children, &expected.children, path),
    }
}

fn match_positional(
    actual: &[SnapshotNode],
    expected: &[ExpectedNode],
    path: &mut Vec<String>,
) -> Outcome {
    for (index, expected_child) in expected.iter().enumerate() {
        path.push(format!("{}[{}]", expected_child.label(), index));
        let Some(actual_child) = actual.get(index) else {
            return Err(MatchResult::mismatch(path, expected_child.describe(), "missing"));
        };
        match_node(actual_child, expected_child, path)?;
        path.pop();
    }
    Ok(())
}

/// Exact multiset comparison: counts must agree and every expected child
/// must be paired with a distinct actual child
fn match_unordered(
    actual: &[SnapshotNode],
    expected: &[ExpectedNode],
    path: &mut Vec<String>,
) -> Outcome {
    if actual.len() != expected.len() {
        return Err(MatchResult::mismatch(
            path,
            format!("{} children", expected.len()),
            format!("{} children", actual.len()),
        ));
    }

    let compatible: Vec<Vec<bool>> = expected
        .iter()
        .map(|exp| {
            actual
                .iter()
                .map(|act| match_node(act, exp, &mut Vec::new()).is_ok())
                .collect()
        })
        .collect();

    // Augmenting-path bipartite matching; owner[j] is the expected child paired with actual j
    let mut owner: Vec<Option<usize>> = vec![None; actual.len()];
    for i in 0..expected.len() {
        let mut visited = vec![false; actual.len()];
        if !augment(i, &compatible, &mut owner, &mut visited) {
            path.push(format!("{}[{}]", expected[i].label(), i));
            return Err(MatchResult::mismatch(
                path,
                expected[i].describe(),
                "no matching child",
            ));
        }
    }
    Ok(())
}

fn augment(
    i: usize,
    compatible: &[Vec<bool>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for j in 0..owner.len() {
        if !compatible[i][j] || visited[j] {
            continue;
        }
        visited[j] = true;
        let free = match owner[j] {
            None => true,
            Some(other) => augment(other, compatible, owner, visited),
        };
        if free {
            owner[j] = Some(i);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav() -> SnapshotNode {
        SnapshotNode::new("navigation").with_child(
            SnapshotNode::new("list").with_children([
                SnapshotNode::new("listitem").with_text("Feature A"),
                SnapshotNode::new("listitem").with_child(
                    SnapshotNode::new("link")
                        .with_name("Feature B")
                        .with_attribute("/url", "https://playwright.dev")
                        .with_text("Feature B"),
                ),
            ]),
        )
    }

    #[test]
    fn test_case_sensitive_inline_text() {
        let actual = SnapshotNode::new("listitem").with_text("Home");

        assert!(compare_text(&actual, "- listitem: \"Home\"").unwrap().ok);

        let result = compare_text(&actual, "- listitem: \"home\"").unwrap();
        assert!(!result.ok);
        assert_eq!(result.path, vec!["listitem".to_string()]);
        assert_eq!(result.expected, "home");
        assert_eq!(result.actual, "Home");
    }

    #[test]
    fn test_nested_match_with_url() {
        let result = compare_text(
            &nav(),
            r#"
  - navigation:
    - list:
      - /children: equal
      - listitem: Feature A
      - listitem:
        - link "Feature B":
          - /url: "https://playwright.dev"
"#,
        )
        .unwrap();
        assert!(result.ok, "{:?}", result);
    }

    #[test]
    fn test_attribute_mismatch_reports_path() {
        let result = compare_text(
            &nav(),
            r#"
- navigation:
  - list:
    - listitem: Feature A
    - listitem:
      - link "Feature B":
        - /url: https://example.com
"#,
        )
        .unwrap();
        assert!(!result.ok);
        assert_eq!(
            result.path,
            vec!["navigation", "list[0]", "listitem[1]", "link[0]"]
        );
        assert_eq!(result.expected, "/url=https://example.com");
        assert_eq!(result.actual, "/url=https://playwright.dev");
        assert_eq!(
            result.breadcrumbs(),
            "[navigation > list[0] > listitem[1] > link[0]]"
        );
    }

    #[test]
    fn test_extra_actual_attributes_are_ignored() {
        let actual = SnapshotNode::new("heading")
            .with_name("Welcome")
            .with_attribute("level", "1")
            .with_attribute("id", "top");
        assert!(compare_text(&actual, "- heading \"Welcome\" [level=1]").unwrap().ok);
        assert!(!compare_text(&actual, "- heading \"Welcome\" [level=2]").unwrap().ok);
    }

    #[test]
    fn test_role_mismatch_fails_fast() {
        let result = compare_text(&nav(), "- navigation:\n  - menu:\n    - listitem: Nope\n")
            .unwrap();
        assert_eq!(result.path, vec!["navigation", "menu[0]"]);
        assert_eq!(result.expected, "menu");
        assert_eq!(result.actual, "list");
    }

    #[test]
    fn test_name_pattern() {
        let actual = SnapshotNode::new("link").with_name("About Us");
        assert!(compare_text(&actual, "- link /About.*/").unwrap().ok);
        assert!(!compare_text(&actual, "- link /^Contact/").unwrap().ok);
    }

    #[test]
    fn test_children_equal_ignores_order() {
        let actual = SnapshotNode::new("list").with_children([
            SnapshotNode::new("listitem").with_text("B"),
            SnapshotNode::new("listitem").with_text("A"),
        ]);
        let template = "- list:\n  - /children: equal\n  - listitem: A\n  - listitem: B\n";
        assert!(compare_text(&actual, template).unwrap().ok);

        // positional comparison of the same template fails on the first item
        let positional = "- list:\n  - listitem: A\n  - listitem: B\n";
        let result = compare_text(&actual, positional).unwrap();
        assert_eq!(result.path, vec!["list", "listitem[0]"]);
    }

    #[test]
    fn test_children_equal_detects_added_and_removed() {
        let template = "- list:\n  - /children: equal\n  - listitem: A\n  - listitem: B\n";

        let added = SnapshotNode::new("list").with_children([
            SnapshotNode::new("listitem").with_text("A"),
            SnapshotNode::new("listitem").with_text("B"),
            SnapshotNode::new("listitem").with_text("C"),
        ]);
        let result = compare_text(&added, template).unwrap();
        assert!(!result.ok);
        assert_eq!(result.expected, "2 children");
        assert_eq!(result.actual, "3 children");

        let removed = SnapshotNode::new("list").with_text("A");
        assert!(!compare_text(&removed, template).unwrap().ok);
    }

    #[test]
    fn test_children_equal_is_a_multiset() {
        let template = "- list:\n  - /children: equal\n  - listitem: A\n  - listitem: A\n";
        let actual = SnapshotNode::new("list").with_children([
            SnapshotNode::new("listitem").with_text("A"),
            SnapshotNode::new("listitem").with_text("B"),
        ]);
        let result = compare_text(&actual, template).unwrap();
        assert!(!result.ok);
        assert_eq!(result.path, vec!["list", "listitem[1]"]);
        assert_eq!(result.actual, "no matching child");
    }

    #[test]
    fn test_children_equal_needs_reassignment() {
        // /A/ accepts both items, "B" only the first; a greedy pairing would fail
        let template = "- list:\n  - /children: equal\n  - listitem: /A|B/\n  - listitem: B\n";
        let actual = SnapshotNode::new("list").with_children([
            SnapshotNode::new("listitem").with_text("B"),
            SnapshotNode::new("listitem").with_text("A"),
        ]);
        assert!(compare_text(&actual, template).unwrap().ok);
    }

    #[test]
    fn test_missing_child() {
        let actual = SnapshotNode::new("list").with_text("A");
        let result = compare_text(&actual, "- list:\n  - text: A\n  - listitem: B\n").unwrap();
        assert_eq!(result.path, vec!["list", "listitem[1]"]);
        assert_eq!(result.actual, "missing");
    }

    #[test]
    fn test_text_only_node_uses_flattened_text() {
        let actual = SnapshotNode::new("contentinfo").with_child(
            SnapshotNode::new("paragraph").with_text("Copyright").with_text("2023"),
        );
        assert!(compare_text(&actual, "- text: Copyright 2023").unwrap().ok);
    }

    #[test]
    fn test_roots_compared_as_children() {
        let body = SnapshotNode::new("body").with_children([
            SnapshotNode::new("navigation"),
            SnapshotNode::new("main").with_child(
                SnapshotNode::new("heading").with_name("Welcome").with_attribute("level", "1"),
            ),
        ]);
        let result = compare_text(
            &body,
            "- navigation\n- main:\n  - heading \"Welcome\" [level=1]\n",
        )
        .unwrap();
        assert!(result.ok, "{:?}", result);
    }

    #[test]
    fn test_empty_expected() {
        let empty = ExpectedSnapshot::default();
        assert!(compare(&SnapshotNode::new("main"), &empty).ok);

        let result = compare(&SnapshotNode::new("main").with_text("hi"), &empty);
        assert!(!result.ok);
        assert_eq!(result.path, vec!["main"]);
    }

    #[test]
    fn test_into_result() {
        assert!(MatchResult::matched().into_result().is_ok());

        let actual = SnapshotNode::new("listitem").with_text("Home");
        let err = compare_text(&actual, "- listitem: home")
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Snapshot mismatch at [listitem]: expected home, got Home"
        );
    }
}
