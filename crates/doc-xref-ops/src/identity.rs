use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path};

/// Root-relative, extension-stripped page identity such as `/guides/intro`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PageId(String);

impl PageId {
    /// Wrap an identity string as written in a link; no normalisation happens.
    pub fn new(value: impl Into<String>) -> Self {
        PageId(value.into())
    }

    /// Derive the identity of a file from its path relative to the content root.
    pub fn from_relative_path(relative: &Path) -> Self {
        let stem = relative.with_extension("");
        let mut identity = String::new();
        for component in stem.components() {
            if let Component::Normal(segment) = component {
                identity.push('/');
                identity.push_str(&segment.to_string_lossy());
            }
        }
        if identity.is_empty() {
            identity.push('/');
        }
        PageId(identity)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        PageId::new(value)
    }
}
