use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a child profile
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChildId(u64);

impl ChildId {
    /// Creates a new `ChildId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Row identifier for a persisted progress record
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressId(i64);

impl ProgressId {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Maximum length of an activity slug.
pub const MAX_ACTIVITY_ID_LEN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("activity id cannot be empty")]
    EmptyActivityId,

    #[error("activity id too long: {len} > {MAX_ACTIVITY_ID_LEN}")]
    ActivityIdTooLong { len: usize },

    #[error("activity id may only contain a-z, 0-9 and '_': {raw}")]
    InvalidActivityId { raw: String },
}

/// Stable slug for an activity, e.g. `letter_a`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActivityId(String);

impl ActivityId {
    /// Validate and wrap an activity slug.
    ///
    /// # Errors
    ///
    /// Returns `IdError` if the slug is empty, too long, or contains characters
    /// other than lowercase ASCII letters, digits and underscores.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdError::EmptyActivityId);
        }
        if raw.len() > MAX_ACTIVITY_ID_LEN {
            return Err(IdError::ActivityIdTooLong { len: raw.len() });
        }
        let valid = raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(IdError::InvalidActivityId { raw });
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActivityId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActivityId> for String {
    fn from(value: ActivityId) -> Self {
        value.0
    }
}

impl AsRef<str> for ActivityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChildId({})", self.0)
    }
}

impl fmt::Debug for ProgressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgressId({})", self.0)
    }
}

impl fmt::Debug for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActivityId({})", self.0)
    }
}

// ─── Display Implementations ────────────────────────────────────────────────

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProgressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ChildId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ChildId::new)
            .map_err(|_| ParseIdError { kind: "ChildId" })
    }
}

impl FromStr for ActivityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityId::new(s.trim())
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_id_display_and_parse() {
        let id: ChildId = " 12 ".parse().unwrap();
        assert_eq!(id, ChildId::new(12));
        assert_eq!(id.to_string(), "12");
        assert!("twelve".parse::<ChildId>().is_err());
    }

    #[test]
    fn activity_id_accepts_slugs() {
        let id = ActivityId::new("letter_a").unwrap();
        assert_eq!(id.as_str(), "letter_a");
        assert_eq!(format!("{id:?}"), "ActivityId(letter_a)");
    }

    #[test]
    fn activity_id_rejects_bad_input() {
        assert_eq!(ActivityId::new(""), Err(IdError::EmptyActivityId));
        assert!(matches!(
            ActivityId::new("Letter-A"),
            Err(IdError::InvalidActivityId { .. })
        ));
        let long = "a".repeat(MAX_ACTIVITY_ID_LEN + 1);
        assert!(matches!(
            ActivityId::new(long),
            Err(IdError::ActivityIdTooLong { len }) if len == MAX_ACTIVITY_ID_LEN + 1
        ));
    }
}
