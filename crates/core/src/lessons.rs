//! Static letter content: example words per letter and quiz distractors.

use crate::model::Letter;

/// Example words used when a letter has no dedicated word list.
pub const DEFAULT_EXAMPLE_WORDS: &[&str] = &["Apple", "Ant", "Airplane"];

/// Words that never start with a taught letter; two of them fill each quiz round.
pub const DISTRACTOR_POOL: &[&str] = &["Zebra", "Xylophone", "Yogurt", "Umbrella"];

const LETTER_EXAMPLES: &[(char, &[&str])] = &[
    ('A', &["Apple", "Ant", "Airplane"]),
    ('B', &["Ball", "Bear", "Book"]),
    ('C', &["Cat", "Car", "Cake"]),
    ('D', &["Dog", "Duck", "Door"]),
    ('E', &["Elephant", "Egg", "Eye"]),
    ('F', &["Fish", "Flower", "Fire"]),
    ('G', &["Goat", "Guitar", "Gift"]),
    ('H', &["Hat", "House", "Horse"]),
    ('I', &["Ice", "Island", "Insect"]),
    ('J', &["Jar", "Jump", "Juice"]),
];

/// Supplies per-letter example words and quiz distractors.
///
/// Implementations must be deterministic: the same letter always yields the
/// same 1–3 words, and unknown letters yield a fixed default list.
pub trait ContentProvider: Send + Sync {
    fn example_words(&self, letter: Letter) -> &[&'static str];

    fn distractors(&self) -> &[&'static str];
}

/// Built-in word tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticContentProvider;

impl StaticContentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// True if `letter` has its own word list.
    #[must_use]
    pub fn has_examples(letter: Letter) -> bool {
        LETTER_EXAMPLES.iter().any(|(c, _)| *c == letter.upper())
    }
}

impl ContentProvider for StaticContentProvider {
    fn example_words(&self, letter: Letter) -> &[&'static str] {
        LETTER_EXAMPLES
            .iter()
            .find(|(c, _)| *c == letter.upper())
            .map_or(DEFAULT_EXAMPLE_WORDS, |(_, words)| *words)
    }

    fn distractors(&self) -> &[&'static str] {
        DISTRACTOR_POOL
    }
}
