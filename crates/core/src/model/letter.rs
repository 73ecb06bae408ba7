use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter used when the requested input is not a single ASCII letter.
pub const FALLBACK_LETTER: Letter = Letter('A');

/// A single uppercase ASCII letter identifying a literacy unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "char", from = "char")]
pub struct Letter(char);

impl Letter {
    /// Build a letter from a character, if it is an ASCII letter.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        c.is_ascii_alphabetic().then(|| Self(c.to_ascii_uppercase()))
    }

    /// Parse user or route input into a letter.
    ///
    /// Anything other than exactly one ASCII letter (after trimming) degrades
    /// to [`FALLBACK_LETTER`].
    #[must_use]
    pub fn parse_or_fallback(raw: &str) -> Self {
        let mut chars = raw.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c).unwrap_or(FALLBACK_LETTER),
            _ => FALLBACK_LETTER,
        }
    }

    /// Uppercase form, e.g. `A`.
    #[must_use]
    pub fn upper(self) -> char {
        self.0
    }

    /// Lowercase form used for the letter sound, e.g. `a`.
    #[must_use]
    pub fn lower(self) -> char {
        self.0.to_ascii_lowercase()
    }
}

impl Default for Letter {
    fn default() -> Self {
        FALLBACK_LETTER
    }
}

impl From<Letter> for char {
    fn from(value: Letter) -> Self {
        value.0
    }
}

impl From<char> for Letter {
    fn from(value: char) -> Self {
        Self::from_char(value).unwrap_or(FALLBACK_LETTER)
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
