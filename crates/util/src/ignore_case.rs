use std::fmt;
use std::hash::{Hash, Hasher};

/// String wrapper that keeps its original spelling but compares and hashes
/// without regard to case.
#[derive(Debug, Clone, Default)]
pub struct IgnoreCase(String);

impl IgnoreCase {
    /// Wrap a string, preserving its case.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The string as originally given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

fn folded(value: &str) -> impl Iterator<Item = char> + '_ {
    value.chars().flat_map(char::to_lowercase)
}

impl PartialEq for IgnoreCase {
    fn eq(&self, other: &Self) -> bool {
        *self == *other.0
    }
}

impl Eq for IgnoreCase {}

impl Hash for IgnoreCase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in folded(&self.0) {
            c.hash(state);
        }
        state.write_u8(0xff);
    }
}

impl PartialEq<str> for IgnoreCase {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other) || folded(&self.0).eq(folded(other))
    }
}

impl fmt::Display for IgnoreCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IgnoreCase {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IgnoreCase {
    fn from(value: String) -> Self {
        Self(value)
    }
}
