use std::borrow::Cow;
use std::hash::{Hash, Hasher};

/// An XML namespace URI. Equality and hashing are by URI only — the prefix used
/// on the wire is chosen later by the alias map built for a whole document, so
/// the same namespace can be written under different prefixes in different
/// documents without changing its identity.
#[derive(Debug, Clone, Eq)]
pub struct Namespace<'a> {
    pub url: Cow<'a, str>,
}

impl<'a> Namespace<'a> {
    pub fn new(url: impl Into<Cow<'a, str>>) -> Self {
        Self { url: url.into() }
    }
}

impl PartialEq for Namespace<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Hash for Namespace<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl std::fmt::Display for Namespace<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl<'a> From<&'a str> for Namespace<'a> {
    fn from(url: &'a str) -> Self {
        Namespace::new(url)
    }
}
