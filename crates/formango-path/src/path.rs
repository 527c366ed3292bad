//! Typed dotted paths.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::PathError;

/// A single segment of a [`Path`].
///
/// A segment that reads as a canonical non-negative integer is an array
/// index, anything else is an object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl PathStep {
    /// Classify a raw segment.
    ///
    /// # Example
    ///
    /// ```
    /// use formango_path::PathStep;
    ///
    /// assert_eq!(PathStep::parse("3"), PathStep::Index(3));
    /// assert_eq!(PathStep::parse("name"), PathStep::Key("name".to_string()));
    /// assert_eq!(PathStep::parse("03"), PathStep::Key("03".to_string()));
    /// ```
    pub fn parse(segment: &str) -> Self {
        if is_valid_index(segment) {
            if let Ok(index) = segment.parse() {
                return PathStep::Index(index);
            }
        }
        PathStep::Key(segment.to_string())
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Index(index) => Some(*index),
            PathStep::Key(_) => None,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathStep::Index(_))
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => f.write_str(key),
            PathStep::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

impl From<&str> for PathStep {
    fn from(segment: &str) -> Self {
        PathStep::parse(segment)
    }
}

/// Check if a string represents a canonical non-negative integer index.
///
/// Leading zeros are rejected so that formatting a parsed path gives back
/// the exact same string.
///
/// # Example
///
/// ```
/// use formango_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("10"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    let bytes = segment.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

/// An ordered list of [`PathStep`]s addressing a location in a document.
///
/// The empty path addresses the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path string. The empty string is rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use formango_path::{Path, PathStep};
    ///
    /// let path = Path::parse("array.10.name").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(path.steps()[1], PathStep::Index(10));
    /// assert!(Path::parse("").is_err());
    /// ```
    pub fn parse(dotted: &str) -> Result<Self, PathError> {
        if dotted.is_empty() {
            return Err(PathError::EmptyPath);
        }
        Ok(Self::from_segments(dotted.split('.')))
    }

    /// Build a path from raw string segments, classifying each one.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            steps: segments
                .into_iter()
                .map(|segment| PathStep::parse(segment.as_ref()))
                .collect(),
        }
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// The index of the final segment, if this path addresses an array element.
    pub fn last_index(&self) -> Option<usize> {
        self.last().and_then(PathStep::as_index)
    }

    /// The path without its final segment. `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.steps.is_empty() {
            return None;
        }
        Some(self.truncate(self.steps.len() - 1))
    }

    /// The first `len` segments of this path.
    pub fn truncate(&self, len: usize) -> Path {
        Path {
            steps: self.steps[..len.min(self.steps.len())].to_vec(),
        }
    }

    /// Append one segment.
    pub fn child(&self, step: impl Into<PathStep>) -> Path {
        let mut steps = self.steps.clone();
        steps.push(step.into());
        Path { steps }
    }

    /// Append every segment of `other`.
    pub fn join(&self, other: &Path) -> Path {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());
        Path { steps }
    }

    /// Segment-wise prefix check. A path starts with itself.
    ///
    /// # Example
    ///
    /// ```
    /// use formango_path::Path;
    ///
    /// let p = |s| Path::parse(s).unwrap();
    /// assert!(p("array.1.name").starts_with(&p("array.1")));
    /// assert!(p("array.1").starts_with(&p("array.1")));
    /// assert!(!p("array.10").starts_with(&p("array.1")));
    /// ```
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.steps.len() >= prefix.steps.len() && self.steps[..prefix.steps.len()] == prefix.steps[..]
    }

    /// Strict descendant check: `self` is longer than `ancestor` and starts with it.
    pub fn is_descendant_of(&self, ancestor: &Path) -> bool {
        self.steps.len() > ancestor.steps.len() && self.starts_with(ancestor)
    }

    /// The remainder of `self` after stripping `ancestor`, for strict descendants only.
    ///
    /// # Example
    ///
    /// ```
    /// use formango_path::Path;
    ///
    /// let p = |s| Path::parse(s).unwrap();
    /// assert_eq!(p("a.bObj.c").relative_to(&p("a")), Some(p("bObj.c")));
    /// assert_eq!(p("a").relative_to(&p("a")), None);
    /// assert_eq!(p("ab.c").relative_to(&p("a")), None);
    /// ```
    pub fn relative_to(&self, ancestor: &Path) -> Option<Path> {
        if !self.is_descendant_of(ancestor) {
            return None;
        }
        Some(Path {
            steps: self.steps[ancestor.steps.len()..].to_vec(),
        })
    }

    /// The step directly following `prefix`, if `self` is a strict descendant of it.
    pub fn step_after(&self, prefix: &Path) -> Option<&PathStep> {
        if !self.is_descendant_of(prefix) {
            return None;
        }
        self.steps.get(prefix.steps.len())
    }

    /// Replace the step at `position`, keeping everything before and after it.
    pub fn with_step(&self, position: usize, step: PathStep) -> Path {
        let mut steps = self.steps.clone();
        if let Some(slot) = steps.get_mut(position) {
            *slot = step;
        }
        Path { steps }
    }

    /// Swap the leading `from` prefix for `to`. `None` when `self` does not start with `from`.
    pub fn replace_prefix(&self, from: &Path, to: &Path) -> Option<Path> {
        if !self.starts_with(from) {
            return None;
        }
        let mut steps = to.steps.clone();
        steps.extend(self.steps[from.steps.len()..].iter().cloned());
        Some(Path { steps })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dotted = String::deserialize(deserializer)?;
        if dotted.is_empty() {
            return Ok(Path::root());
        }
        Path::parse(&dotted).map_err(de::Error::custom)
    }
}
