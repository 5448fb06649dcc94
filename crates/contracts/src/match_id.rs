//! MatchId - shared match identifier
//!
//! One id is handed to every stage and every concurrent aggregation of a
//! match, so it is reference counted rather than copied.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Match identifier.
///
/// Every point written for a match carries this value as its `match_id`
/// tag, and every query filters on it.
///
/// # Examples
/// ```
/// use contracts::MatchId;
///
/// let id: MatchId = "64f1c2".into();
/// assert_eq!(id.as_str(), "64f1c2");
/// assert!(id.is_valid());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct MatchId(Arc<str>);

impl MatchId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is usable as a tag value (non-empty, no control chars).
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty() && !self.0.chars().any(char::is_control)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchId({:?})", self.0)
    }
}

// Stored as a bare string in records and payloads
impl Serialize for MatchId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MatchId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
