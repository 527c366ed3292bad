//! Nested view of the flat issue list, mirroring the document shape.

use indexmap::IndexMap;
use serde::Serialize;

use crate::issue::Issue;

/// Error messages arranged by path: each node holds the messages reported
/// exactly at its location and one child per next segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorTree {
    pub errors: Vec<String>,
    pub children: IndexMap<String, ErrorTree>,
}

impl ErrorTree {
    /// Build a tree from raw issues. Issues without a path are attached to
    /// the root.
    ///
    /// # Example
    ///
    /// ```
    /// use formango::{ErrorTree, Issue};
    ///
    /// let tree = ErrorTree::from_issues(&[
    ///     Issue::at("Required", "user.name"),
    ///     Issue::new("Server error"),
    /// ]);
    /// assert_eq!(tree.errors, vec!["Server error"]);
    /// assert_eq!(tree.get("user.name").unwrap().errors, vec!["Required"]);
    /// ```
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut root = ErrorTree::default();
        for issue in issues {
            let mut node = &mut root;
            if let Some(path) = issue.normalized_path() {
                for step in path.steps() {
                    node = node.children.entry(step.to_string()).or_default();
                }
            }
            node.errors.push(issue.message.clone());
        }
        root
    }

    /// The subtree at a dotted path.
    pub fn get(&self, dotted: &str) -> Option<&ErrorTree> {
        dotted
            .split('.')
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.is_empty()
    }
}
