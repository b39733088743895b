//! Qualified names.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator used between scope segments in BIR strings.
pub const SEPARATOR: &str = "::";

/// Sentinel segment standing in for an anonymous namespace.
pub const ANONYMOUS_SCOPE: &str = "<anon>";

/// A fully qualified name such as `Example01::Point`.
///
/// The root namespace is the empty name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// The name of the root namespace.
    pub fn root() -> Self {
        QualifiedName::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QualifiedName {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a `::`-separated name. Leading `::` (global qualifier) is ignored.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let s = s.strip_prefix(SEPARATOR).unwrap_or(s);
        if s.is_empty() {
            return QualifiedName::root();
        }
        QualifiedName::from_segments(s.split(SEPARATOR).map(str::trim))
    }

    /// Append a child segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        QualifiedName { segments }
    }

    /// Concatenate another (relative) name onto this one.
    pub fn join(&self, other: &QualifiedName) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        QualifiedName { segments }
    }

    /// The enclosing scope, or `None` for the root.
    pub fn parent(&self) -> Option<QualifiedName> {
        if self.segments.is_empty() {
            return None;
        }
        Some(QualifiedName {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The last segment (empty for the root).
    pub fn simple_name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether any segment is anonymous (empty or the `<anon>` sentinel).
    pub fn has_unnamed_scope(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.is_empty() || s == ANONYMOUS_SCOPE)
    }

    /// Whether any segment is a reserved `__` identifier.
    pub fn has_reserved_segment(&self) -> bool {
        self.segments.iter().any(|s| s.starts_with("__"))
    }

    /// Whether `self` is `prefix` or lies inside it.
    pub fn starts_with(&self, prefix: &QualifiedName) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(SEPARATOR))
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for QualifiedName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(QualifiedName::parse(&s))
    }
}
