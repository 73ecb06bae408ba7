//! Built-in activity catalog shown on a child's home screen.

use crate::model::{Activity, ActivityError, ActivityId, ActivityType, Letter, Track};

struct CatalogEntry {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    activity_type: ActivityType,
    track: Track,
    level: u32,
    target_letter: Option<char>,
}

const DEFAULT_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "sounds",
        title: "Animal Sounds",
        description: "Match animals to the sounds they make.",
        activity_type: ActivityType::SoundMatching,
        track: Track::PreAlphabetic,
        level: 1,
        target_letter: None,
    },
    CatalogEntry {
        id: "shapes",
        title: "Shape Matching",
        description: "Find the shapes that look the same.",
        activity_type: ActivityType::LetterRecognition,
        track: Track::PreAlphabetic,
        level: 1,
        target_letter: None,
    },
    CatalogEntry {
        id: "colors",
        title: "Color Fun",
        description: "Name the colors of everyday things.",
        activity_type: ActivityType::LetterRecognition,
        track: Track::PreAlphabetic,
        level: 1,
        target_letter: None,
    },
    CatalogEntry {
        id: "letter_a",
        title: "Learn Letter A",
        description: "Meet the letter A and the words that start with it.",
        activity_type: ActivityType::LetterRecognition,
        track: Track::EarlyAlphabetic,
        level: 1,
        target_letter: Some('A'),
    },
    CatalogEntry {
        id: "letter_b",
        title: "Learn Letter B",
        description: "Meet the letter B and the words that start with it.",
        activity_type: ActivityType::LetterRecognition,
        track: Track::EarlyAlphabetic,
        level: 1,
        target_letter: Some('B'),
    },
    CatalogEntry {
        id: "letter_c",
        title: "Learn Letter C",
        description: "Meet the letter C and the words that start with it.",
        activity_type: ActivityType::LetterRecognition,
        track: Track::EarlyAlphabetic,
        level: 2,
        target_letter: Some('C'),
    },
    CatalogEntry {
        id: "phonics",
        title: "Phonics Fun",
        description: "Connect letters with the sounds they make.",
        activity_type: ActivityType::PhonicsPractice,
        track: Track::FullAlphabetic,
        level: 2,
        target_letter: None,
    },
    CatalogEntry {
        id: "blending",
        title: "Sound Blending",
        description: "Blend sounds together to say whole words.",
        activity_type: ActivityType::WordBuilding,
        track: Track::FullAlphabetic,
        level: 2,
        target_letter: None,
    },
    CatalogEntry {
        id: "word_families",
        title: "Word Families",
        description: "Build rhyming words that share an ending.",
        activity_type: ActivityType::WordBuilding,
        track: Track::FullAlphabetic,
        level: 3,
        target_letter: None,
    },
];

const PRE_ALPHABETIC_SET: [&str; 3] = ["sounds", "shapes", "colors"];
const EARLY_ALPHABETIC_SET: [&str; 3] = ["letter_a", "letter_b", "letter_c"];
const FULL_ALPHABETIC_SET: [&str; 3] = ["phonics", "blending", "word_families"];

/// Slugs of the home-screen activities for `track`.
///
/// Tracks beyond full alphabetic have no dedicated set yet and reuse the
/// early alphabetic one.
#[must_use]
pub fn home_screen_ids(track: Track) -> &'static [&'static str] {
    match track {
        Track::PreAlphabetic => &PRE_ALPHABETIC_SET,
        Track::FullAlphabetic => &FULL_ALPHABETIC_SET,
        Track::EarlyAlphabetic | Track::ConsolidatedAlphabetic | Track::FluencyBuilding => {
            &EARLY_ALPHABETIC_SET
        }
    }
}

/// Builds every built-in activity with catalog defaults applied.
///
/// # Errors
///
/// Returns `ActivityError` if a built-in entry fails validation.
pub fn default_activities() -> Result<Vec<Activity>, ActivityError> {
    DEFAULT_CATALOG
        .iter()
        .map(|entry| {
            let id = ActivityId::new(entry.id)?;
            let mut activity = Activity::new(id, entry.title, entry.activity_type, entry.track)?
                .with_description(entry.description)
                .with_level(entry.level)?;
            if let Some(letter) = entry.target_letter.and_then(Letter::from_char) {
                activity = activity.with_target_letter(letter);
            }
            Ok(activity)
        })
        .collect()
}
