//! Element names: the qualified text as written in the source, and the bare
//! local name used for every comparison.

use std::fmt;

/// Strip a `prefix:` from a tag, returning the bare local name.
pub fn bare(tag: &str) -> &str {
    tag.rsplit_once(':').map_or(tag, |(_, local)| local)
}

/// A qualified element name (`d:PROPERTY`, or `PROPERTY` when unprefixed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementName {
    qualified: String,
}

impl ElementName {
    pub fn new(qualified: impl Into<String>) -> Self {
        Self {
            qualified: qualified.into(),
        }
    }

    pub fn from_parts(prefix: Option<&str>, local: &str) -> Self {
        match prefix {
            Some(prefix) if !prefix.is_empty() => Self::new(format!("{prefix}:{local}")),
            _ => Self::new(local),
        }
    }

    /// The tag exactly as it appeared in the document.
    pub fn qualified(&self) -> &str {
        &self.qualified
    }

    pub fn bare(&self) -> &str {
        bare(&self.qualified)
    }

    /// The name as it is written in an XPath step.
    ///
    /// A non-empty `namespace_prefix` replaces whatever prefix the source
    /// used; an empty one keeps the source's own qualified tag.
    pub fn step_name(&self, namespace_prefix: &str) -> String {
        if namespace_prefix.is_empty() {
            self.qualified.clone()
        } else {
            format!("{namespace_prefix}:{}", self.bare())
        }
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified)
    }
}
