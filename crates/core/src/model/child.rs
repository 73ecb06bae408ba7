use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ChildId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

pub const MAX_CHILD_NAME_LEN: usize = 50;
pub const MIN_CHILD_AGE: u8 = 2;
pub const MAX_CHILD_AGE: u8 = 10;

/// Points needed to climb one level.
pub const POINTS_PER_LEVEL: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChildError {
    #[error("child name cannot be empty")]
    EmptyName,

    #[error("child name too long: {len} > {MAX_CHILD_NAME_LEN}")]
    NameTooLong { len: usize },

    #[error("age must be between {MIN_CHILD_AGE} and {MAX_CHILD_AGE}, got {age}")]
    InvalidAge { age: u8 },

    #[error("level must be >= 1")]
    InvalidLevel,

    #[error("unknown avatar: {0}")]
    UnknownAvatar(String),

    #[error("unknown track: {0}")]
    UnknownTrack(String),
}

//
// ─── AVATAR ────────────────────────────────────────────────────────────────────
//

/// Animal avatar shown on a child's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Avatar {
    #[default]
    Bear,
    Cat,
    Dog,
    Elephant,
    Fox,
    Lion,
    Owl,
    Rabbit,
}

impl Avatar {
    pub const ALL: [Avatar; 8] = [
        Avatar::Bear,
        Avatar::Cat,
        Avatar::Dog,
        Avatar::Elephant,
        Avatar::Fox,
        Avatar::Lion,
        Avatar::Owl,
        Avatar::Rabbit,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Avatar::Bear => "bear",
            Avatar::Cat => "cat",
            Avatar::Dog => "dog",
            Avatar::Elephant => "elephant",
            Avatar::Fox => "fox",
            Avatar::Lion => "lion",
            Avatar::Owl => "owl",
            Avatar::Rabbit => "rabbit",
        }
    }
}

impl FromStr for Avatar {
    type Err = ChildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Avatar::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ChildError::UnknownAvatar(s.to_owned()))
    }
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── TRACK ─────────────────────────────────────────────────────────────────────
//

/// Literacy-progression band used to pick a child's default activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    PreAlphabetic,
    EarlyAlphabetic,
    FullAlphabetic,
    ConsolidatedAlphabetic,
    FluencyBuilding,
}

impl Track {
    pub const ALL: [Track; 5] = [
        Track::PreAlphabetic,
        Track::EarlyAlphabetic,
        Track::FullAlphabetic,
        Track::ConsolidatedAlphabetic,
        Track::FluencyBuilding,
    ];

    /// Starting track for a newly created profile.
    #[must_use]
    pub fn for_age(age: u8) -> Self {
        match age {
            6.. => Track::ConsolidatedAlphabetic,
            5 => Track::FullAlphabetic,
            4 => Track::EarlyAlphabetic,
            _ => Track::PreAlphabetic,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Track::PreAlphabetic => "pre_alphabetic",
            Track::EarlyAlphabetic => "early_alphabetic",
            Track::FullAlphabetic => "full_alphabetic",
            Track::ConsolidatedAlphabetic => "consolidated_alphabetic",
            Track::FluencyBuilding => "fluency_building",
        }
    }

    /// Human readable label, e.g. `Early Alphabetic`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Track::PreAlphabetic => "Pre Alphabetic",
            Track::EarlyAlphabetic => "Early Alphabetic",
            Track::FullAlphabetic => "Full Alphabetic",
            Track::ConsolidatedAlphabetic => "Consolidated Alphabetic",
            Track::FluencyBuilding => "Fluency Building",
        }
    }
}

impl FromStr for Track {
    type Err = ChildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Track::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ChildError::UnknownTrack(s.to_owned()))
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── CHILD ─────────────────────────────────────────────────────────────────────
//

/// Effect of crediting a completed activity to a child's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsAward {
    pub points_awarded: u32,
    pub total_points: u32,
    pub current_level: u32,
    pub daily_streak: u32,
    pub leveled_up: bool,
}

/// A child profile managed by a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    id: ChildId,
    name: String,
    age: u8,
    avatar: Avatar,
    track: Track,
    current_level: u32,
    total_points: u32,
    daily_streak: u32,
    last_activity_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl Child {
    /// Create a brand-new profile: level 1, no points, track chosen from age.
    ///
    /// # Errors
    ///
    /// Returns `ChildError` if the name or age fail validation.
    pub fn new(
        id: ChildId,
        name: impl Into<String>,
        age: u8,
        avatar: Avatar,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ChildError> {
        let name = validate_name(name.into())?;
        validate_age(age)?;
        Ok(Self {
            id,
            name,
            age,
            avatar,
            track: Track::for_age(age),
            current_level: 1,
            total_points: 0,
            daily_streak: 0,
            last_activity_date: None,
            created_at,
        })
    }

    /// Rehydrate a child from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ChildError` if persisted values violate profile invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: ChildId,
        name: String,
        age: u8,
        avatar: Avatar,
        track: Track,
        current_level: u32,
        total_points: u32,
        daily_streak: u32,
        last_activity_date: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ChildError> {
        let name = validate_name(name)?;
        validate_age(age)?;
        if current_level == 0 {
            return Err(ChildError::InvalidLevel);
        }
        Ok(Self {
            id,
            name,
            age,
            avatar,
            track,
            current_level,
            total_points,
            daily_streak,
            last_activity_date,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ChildId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[must_use]
    pub fn avatar(&self) -> Avatar {
        self.avatar
    }

    #[must_use]
    pub fn track(&self) -> Track {
        self.track
    }

    #[must_use]
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub fn daily_streak(&self) -> u32 {
        self.daily_streak
    }

    #[must_use]
    pub fn last_activity_date(&self) -> Option<NaiveDate> {
        self.last_activity_date
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Same profile under a storage-assigned id.
    #[must_use]
    pub fn with_id(mut self, id: ChildId) -> Self {
        self.id = id;
        self
    }

    /// Replace the editable profile fields. The track follows the new age.
    ///
    /// # Errors
    ///
    /// Returns `ChildError` if the name or age fail validation.
    pub fn update_profile(
        &mut self,
        name: impl Into<String>,
        age: u8,
        avatar: Avatar,
    ) -> Result<(), ChildError> {
        let name = validate_name(name.into())?;
        validate_age(age)?;
        self.name = name;
        self.age = age;
        self.avatar = avatar;
        self.track = Track::for_age(age);
        Ok(())
    }

    /// Credit points for a finished activity on `today`.
    ///
    /// The level never decreases; the streak grows on consecutive days, is
    /// unchanged on the same day, and resets to one after a gap.
    pub fn award_points(&mut self, points: u32, today: NaiveDate) -> PointsAward {
        self.total_points = self.total_points.saturating_add(points);

        let earned_level = self.total_points / POINTS_PER_LEVEL + 1;
        let previous_level = self.current_level;
        self.current_level = self.current_level.max(earned_level);

        self.daily_streak = match self.last_activity_date {
            Some(last) if last == today => self.daily_streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.daily_streak.saturating_add(1),
            _ => 1,
        };
        self.last_activity_date = Some(today);

        PointsAward {
            points_awarded: points,
            total_points: self.total_points,
            current_level: self.current_level,
            daily_streak: self.daily_streak,
            leveled_up: self.current_level > previous_level,
        }
    }

    /// True if the child finished something in the `days` up to and including `today`.
    ///
    /// A last activity date after `today` does not count.
    #[must_use]
    pub fn active_within(&self, today: NaiveDate, days: i64) -> bool {
        self.last_activity_date
            .is_some_and(|last| (0..=days).contains(&(today - last).num_days()))
    }
}

fn validate_name(raw: String) -> Result<String, ChildError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ChildError::EmptyName);
    }
    let len = trimmed.chars().count();
    if len > MAX_CHILD_NAME_LEN {
        return Err(ChildError::NameTooLong { len });
    }
    Ok(trimmed.to_owned())
}

fn validate_age(age: u8) -> Result<(), ChildError> {
    if (MIN_CHILD_AGE..=MAX_CHILD_AGE).contains(&age) {
        Ok(())
    } else {
        Err(ChildError::InvalidAge { age })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
