//! Globally unique block identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A uid identifies a block across registries.
///
/// Arena indices change whenever registries are merged or rebuilt, the uid
/// does not: it is assigned once at registration and survives merge and
/// serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(Ulid);

impl Uid {
    /// Generates a fresh uid.
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Parses a uid from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Ulid::from_str(s).ok().map(Self)
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = Uid::generate();
        let b = Uid::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_display() {
        let uid = Uid::generate();
        let parsed = Uid::parse(&uid.to_string()).unwrap();
        assert_eq!(parsed, uid);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Uid::parse("not a uid").is_none());
    }
}
