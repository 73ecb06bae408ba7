use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::child::Track;
use crate::model::ids::{ActivityId, IdError};
use crate::model::letter::Letter;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActivityError {
    #[error("activity title cannot be empty")]
    EmptyTitle,

    #[error("activity level must be >= 1")]
    InvalidLevel,

    #[error("estimated duration must be > 0 minutes")]
    InvalidDuration,

    #[error("unknown activity type: {0}")]
    UnknownType(String),

    #[error(transparent)]
    Id(#[from] IdError),
}

//
// ─── ACTIVITY TYPE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    LetterRecognition,
    SoundMatching,
    WordBuilding,
    PhonicsPractice,
    ReadingPractice,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::LetterRecognition,
        ActivityType::SoundMatching,
        ActivityType::WordBuilding,
        ActivityType::PhonicsPractice,
        ActivityType::ReadingPractice,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::LetterRecognition => "letter_recognition",
            ActivityType::SoundMatching => "sound_matching",
            ActivityType::WordBuilding => "word_building",
            ActivityType::PhonicsPractice => "phonics_practice",
            ActivityType::ReadingPractice => "reading_practice",
        }
    }
}

impl FromStr for ActivityType {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ActivityError::UnknownType(s.to_owned()))
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ACTIVITY ──────────────────────────────────────────────────────────────────
//

pub const DEFAULT_ESTIMATED_MINUTES: u32 = 15;
pub const DEFAULT_POINTS_VALUE: u32 = 10;
pub const DEFAULT_MINIMUM_AGE: u8 = 2;

/// A catalog entry a child can open from their home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    id: ActivityId,
    title: String,
    description: String,
    activity_type: ActivityType,
    track: Track,
    level: u32,
    target_letter: Option<Letter>,
    estimated_minutes: u32,
    points_value: u32,
    minimum_age: u8,
}

impl Activity {
    /// Create an activity with the catalog defaults for duration, points and age.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::EmptyTitle` if the title is blank.
    pub fn new(
        id: ActivityId,
        title: impl Into<String>,
        activity_type: ActivityType,
        track: Track,
    ) -> Result<Self, ActivityError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ActivityError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description: String::new(),
            activity_type,
            track,
            level: 1,
            target_letter: None,
            estimated_minutes: DEFAULT_ESTIMATED_MINUTES,
            points_value: DEFAULT_POINTS_VALUE,
            minimum_age: DEFAULT_MINIMUM_AGE,
        })
    }

    /// Rehydrate an activity from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError` if persisted values violate catalog invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: ActivityId,
        title: String,
        description: String,
        activity_type: ActivityType,
        track: Track,
        level: u32,
        target_letter: Option<Letter>,
        estimated_minutes: u32,
        points_value: u32,
        minimum_age: u8,
    ) -> Result<Self, ActivityError> {
        let mut activity = Self::new(id, title, activity_type, track)?
            .with_description(description)
            .with_level(level)?
            .with_estimated_minutes(estimated_minutes)?
            .with_points_value(points_value)
            .with_minimum_age(minimum_age);
        activity.target_letter = target_letter;
        Ok(activity)
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// # Errors
    ///
    /// Returns `ActivityError::InvalidLevel` for level 0.
    pub fn with_level(mut self, level: u32) -> Result<Self, ActivityError> {
        if level == 0 {
            return Err(ActivityError::InvalidLevel);
        }
        self.level = level;
        Ok(self)
    }

    #[must_use]
    pub fn with_target_letter(mut self, letter: Letter) -> Self {
        self.target_letter = Some(letter);
        self
    }

    /// # Errors
    ///
    /// Returns `ActivityError::InvalidDuration` for a zero duration.
    pub fn with_estimated_minutes(mut self, minutes: u32) -> Result<Self, ActivityError> {
        if minutes == 0 {
            return Err(ActivityError::InvalidDuration);
        }
        self.estimated_minutes = minutes;
        Ok(self)
    }

    #[must_use]
    pub fn with_points_value(mut self, points: u32) -> Self {
        self.points_value = points;
        self
    }

    #[must_use]
    pub fn with_minimum_age(mut self, age: u8) -> Self {
        self.minimum_age = age;
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &ActivityId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    #[must_use]
    pub fn track(&self) -> Track {
        self.track
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn target_letter(&self) -> Option<Letter> {
        self.target_letter
    }

    #[must_use]
    pub fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    #[must_use]
    pub fn points_value(&self) -> u32 {
        self.points_value
    }

    #[must_use]
    pub fn minimum_age(&self) -> u8 {
        self.minimum_age
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ActivityId {
        ActivityId::new(raw).unwrap()
    }

    #[test]
    fn defaults_match_catalog_conventions() {
        let activity = Activity::new(
            id("letter_a"),
            "Learn Letter A",
            ActivityType::LetterRecognition,
            Track::EarlyAlphabetic,
        )
        .unwrap();
        assert_eq!(activity.estimated_minutes(), DEFAULT_ESTIMATED_MINUTES);
        assert_eq!(activity.points_value(), DEFAULT_POINTS_VALUE);
        assert_eq!(activity.minimum_age(), DEFAULT_MINIMUM_AGE);
        assert_eq!(activity.level(), 1);
        assert!(activity.target_letter().is_none());
    }

    #[test]
    fn blank_title_and_zero_level_are_rejected() {
        assert_eq!(
            Activity::new(id("x"), "  ", ActivityType::WordBuilding, Track::FullAlphabetic)
                .unwrap_err(),
            ActivityError::EmptyTitle
        );
        let activity =
            Activity::new(id("x"), "X", ActivityType::WordBuilding, Track::FullAlphabetic)
                .unwrap();
        assert_eq!(activity.with_level(0).unwrap_err(), ActivityError::InvalidLevel);
    }

    #[test]
    fn from_persisted_keeps_every_field() {
        let activity = Activity::from_persisted(
            id("letter_b"),
            "Learn Letter B".into(),
            "Ball, Bear, Book".into(),
            ActivityType::LetterRecognition,
            Track::EarlyAlphabetic,
            2,
            Some(Letter::from('b')),
            10,
            25,
            4,
        )
        .unwrap();
        assert_eq!(activity.level(), 2);
        assert_eq!(activity.target_letter().map(Letter::upper), Some('B'));
        assert_eq!(activity.estimated_minutes(), 10);
        assert_eq!(activity.points_value(), 25);
        assert_eq!(activity.minimum_age(), 4);
        assert_eq!(activity.description(), "Ball, Bear, Book");
    }

    #[test]
    fn activity_type_round_trips_through_str() {
        for ty in ActivityType::ALL {
            assert_eq!(ty.as_str().parse::<ActivityType>().unwrap(), ty);
        }
        assert!("dance".parse::<ActivityType>().is_err());
    }
}
