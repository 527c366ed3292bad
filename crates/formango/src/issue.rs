//! Validation issues as produced by a schema, and their formatted form.

use formango_path::{Path, PathStep};
use serde::{Deserialize, Serialize};

/// Key of a wrapped path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(u64),
    Key(String),
}

/// One segment of an issue path as a schema reports it: a plain key, a plain
/// index, or a `{ "key": ... }` wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuePathItem {
    Index(u64),
    Key(String),
    Segment { key: PathKey },
}

impl IssuePathItem {
    /// The plain segment text, unwrapping `{ key }` objects.
    pub fn segment(&self) -> String {
        match self {
            IssuePathItem::Index(index) | IssuePathItem::Segment { key: PathKey::Index(index) } => index.to_string(),
            IssuePathItem::Key(key) | IssuePathItem::Segment { key: PathKey::Key(key) } => key.clone(),
        }
    }
}

impl From<&PathStep> for IssuePathItem {
    fn from(step: &PathStep) -> Self {
        match step {
            PathStep::Index(index) => IssuePathItem::Index(*index as u64),
            PathStep::Key(key) => IssuePathItem::Key(key.clone()),
        }
    }
}

/// A raw validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<IssuePathItem>>,
}

impl Issue {
    /// An issue without a path, attached to the whole document.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// An issue located at a dotted path.
    ///
    /// # Example
    ///
    /// ```
    /// use formango::{Issue, IssuePathItem};
    ///
    /// let issue = Issue::at("Required", "users.0.name");
    /// assert_eq!(
    ///     issue.path,
    ///     Some(vec![
    ///         IssuePathItem::Key("users".into()),
    ///         IssuePathItem::Index(0),
    ///         IssuePathItem::Key("name".into()),
    ///     ])
    /// );
    /// ```
    pub fn at(message: impl Into<String>, dotted: &str) -> Self {
        let path = if dotted.is_empty() {
            Vec::new()
        } else {
            Path::from_segments(dotted.split('.')).steps().iter().map(IssuePathItem::from).collect()
        };
        Self {
            message: message.into(),
            path: Some(path),
        }
    }

    /// An issue located at a typed path.
    pub fn at_path(message: impl Into<String>, path: &Path) -> Self {
        Self {
            message: message.into(),
            path: Some(path.steps().iter().map(IssuePathItem::from).collect()),
        }
    }

    /// The issue path normalised to plain segments. `None` when the issue has
    /// no path or an empty one.
    pub fn normalized_path(&self) -> Option<Path> {
        match &self.path {
            Some(items) if !items.is_empty() => Some(Path::from_segments(items.iter().map(IssuePathItem::segment))),
            _ => None,
        }
    }
}

/// An issue with its path flattened to a dotted string, as exposed by
/// `errors()`. `path` is `None` when the issue refers to the node itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedError {
    pub message: String,
    pub path: Option<String>,
}

impl FormattedError {
    pub fn new(message: impl Into<String>, path: Option<&str>) -> Self {
        Self {
            message: message.into(),
            path: path.map(str::to_string),
        }
    }

    /// Convert back into a raw issue, splitting the dotted path.
    pub fn into_issue(self) -> Issue {
        match self.path {
            Some(dotted) => Issue::at(self.message, &dotted),
            None => Issue {
                message: self.message,
                path: Some(Vec::new()),
            },
        }
    }
}

impl From<&Issue> for FormattedError {
    fn from(issue: &Issue) -> Self {
        Self {
            message: issue.message.clone(),
            path: issue.normalized_path().map(|path| path.to_string()),
        }
    }
}
