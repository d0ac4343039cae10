// Role identifiers (spec.md §3 "Role")

use std::fmt;

/// An identifier denoting a participant in a protocol.
///
/// Roles are plain names: the accepted grammar (spec.md §6.1) has no notion
/// of parameterized or indexed roles — that belongs to the DMst extension,
/// out of scope per spec.md §1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role(pub String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Role(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::new(s)
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::new(s)
    }
}
