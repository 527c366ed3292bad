//! Filtering the flat issue list down to one node.
//!
//! An issue belongs to a node when its path equals the node's path or lies
//! strictly below it. Its path is then rewritten relative to the node: empty
//! for the node itself, the remaining segments for a descendant.

use formango_path::Path;

use crate::issue::{FormattedError, Issue, IssuePathItem};

/// The relative location of `issue` under `node`, if it belongs there.
fn relative(issue: &Issue, node: &Path) -> Option<Path> {
    let path = issue.normalized_path()?;
    if path == *node {
        return Some(Path::root());
    }
    path.relative_to(node)
}

/// Issues scoped to `node`, with dotted relative paths.
pub(crate) fn scoped_errors(issues: &[Issue], node: &Path) -> Vec<FormattedError> {
    issues
        .iter()
        .filter_map(|issue| {
            let rel = relative(issue, node)?;
            let path = (!rel.is_root()).then(|| rel.to_string());
            Some(FormattedError {
                message: issue.message.clone(),
                path,
            })
        })
        .collect()
}

/// Issues scoped to `node`, keeping segment paths.
pub(crate) fn scoped_raw_errors(issues: &[Issue], node: &Path) -> Vec<Issue> {
    issues
        .iter()
        .filter_map(|issue| {
            let rel = relative(issue, node)?;
            Some(Issue {
                message: issue.message.clone(),
                path: Some(rel.steps().iter().map(IssuePathItem::from).collect()),
            })
        })
        .collect()
}
