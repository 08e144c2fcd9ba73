//! Stable entity identity
//!
//! A [`Guid`] survives save/load, unlike an entity handle
//! which is only meaningful inside one world. Guids are opaque strings: freshly
//! minted ones are UUID v4 text, but any non-empty string read from a document
//! is accepted as-is.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, string-backed identifier
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    /// Mint a new random guid
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The empty guid, used as "no reference"
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Check if this guid references nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the identifier text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Guid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Guid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Guid(empty)")
        } else {
            write!(f, "Guid({})", self.0)
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_guids_are_unique() {
        let a = Guid::new();
        let b = Guid::new();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let guid = Guid::from("11");
        assert_eq!(serde_json::to_string(&guid).unwrap(), "\"11\"");
        let back: Guid = serde_json::from_str("\"22\"").unwrap();
        assert_eq!(back.as_str(), "22");
    }
}
