//! Caller identity.

use serde::{Deserialize, Serialize};

/// An externally-authenticated caller identity (an address).
///
/// Accounts are never created or destroyed by Credo itself; signature
/// verification happens upstream and hands the core an already-trusted id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Account(pub String);

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An account id must be non-empty once surrounding whitespace is
    /// stripped; the zero identity is rejected everywhere it is offered.
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Account {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
