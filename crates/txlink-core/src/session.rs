//! Session identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key identifying one transport session for its whole lifetime.
///
/// Keys are assigned by the transport when a connection is accepted and are
/// never reused within a process, so per-session state keyed by them cannot
/// leak into a later connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a new SessionKey from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Creates a key from a transport connection number.
    pub fn from_connection(connection_number: u64) -> Self {
        Self(format!("session-{connection_number}"))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_connection() {
        let key = SessionKey::from_connection(7);
        assert_eq!(key.as_str(), "session-7");
        assert_eq!(format!("{key}"), "session-7");
    }

    #[test]
    fn test_keys_compare_by_value() {
        assert_eq!(SessionKey::new("a"), SessionKey::from("a"));
        assert_ne!(SessionKey::new("a"), SessionKey::new("b"));
    }
}
